use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{survey} survey points but {results} match results")]
    LengthMismatch { survey: usize, results: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
