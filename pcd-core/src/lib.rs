pub mod error;
pub mod matching;
pub mod pointcloud;
pub mod survey;

pub use error::{Error, Result};
