pub mod parsers;
pub mod reader;
