use serde::Serialize;

/// Bucket of |dz| used to color survey points on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffClass {
    Green,
    Orange,
    Red,
    Blue,
    Purple,
    NotFound,
}

impl DiffClass {
    pub const ALL: [DiffClass; 6] = [
        DiffClass::Green,
        DiffClass::Orange,
        DiffClass::Red,
        DiffClass::Blue,
        DiffClass::Purple,
        DiffClass::NotFound,
    ];

    pub fn from_dz(dz: Option<f64>) -> Self {
        let Some(dz) = dz.filter(|dz| !dz.is_nan()) else {
            return Self::NotFound;
        };
        match dz.abs() {
            d if d <= 0.1 => Self::Green,
            d if d <= 0.2 => Self::Orange,
            d if d <= 0.5 => Self::Red,
            d if d <= 1.0 => Self::Blue,
            _ => Self::Purple,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::NotFound => "not_found",
        }
    }

    pub fn hex_color(&self) -> &'static str {
        match self {
            Self::Green => "#afffa6",
            Self::Orange => "#ffeaa6",
            Self::Red => "#ffaaaa",
            Self::Blue => "#aaaaff",
            Self::Purple => "#e6a6ff",
            Self::NotFound => "#ffffff",
        }
    }

    pub fn interval(&self) -> &'static str {
        match self {
            Self::Green => "<= 0.1",
            Self::Orange => "0.1 - 0.2",
            Self::Red => "0.2 - 0.5",
            Self::Blue => "0.5 - 1.0",
            Self::Purple => "> 1.0",
            Self::NotFound => "not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_by_absolute_difference() {
        let cases = [
            (Some(0.0), DiffClass::Green),
            (Some(-0.1), DiffClass::Green),
            (Some(0.15), DiffClass::Orange),
            (Some(0.2), DiffClass::Orange),
            (Some(-0.3), DiffClass::Red),
            (Some(0.5), DiffClass::Red),
            (Some(0.75), DiffClass::Blue),
            (Some(-1.0), DiffClass::Blue),
            (Some(1.01), DiffClass::Purple),
            (Some(-25.0), DiffClass::Purple),
            (None, DiffClass::NotFound),
            (Some(f64::NAN), DiffClass::NotFound),
        ];
        for (dz, expected) in cases {
            assert_eq!(DiffClass::from_dz(dz), expected, "{:?}", dz);
        }
    }
}
