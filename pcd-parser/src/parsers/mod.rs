use pcd_core::error::{Error, Result};

use crate::parsers::csv::SurveyTable;

pub mod csv;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<SurveyTable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Las,
    Csv,
    Txt,
}

pub fn get_extension(extension: &str) -> Result<Extension> {
    match extension.to_ascii_lowercase().as_str() {
        "las" => Ok(Extension::Las),
        "csv" => Ok(Extension::Csv),
        "txt" => Ok(Extension::Txt),
        other => Err(Error::InvalidConfig(format!(
            "unsupported file extension '{}'",
            other
        ))),
    }
}
