pub mod classify;
pub mod error;
pub mod geojson;
pub mod report;
pub mod summary;

pub use error::ExportError;
