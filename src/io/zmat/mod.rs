pub mod reader;
pub mod writer;

const FORMAT: &str = "Z-matrix";
