pub mod chunk;
pub mod header;
pub mod point;
