pub mod config;
pub mod index;
pub mod matcher;
pub mod merger;
pub mod pipeline;
pub mod scheduler;

pub use config::MatchConfig;
pub use index::QueryIndex;
pub use pipeline::{compare, compare_files, Comparison};
