//! Chunk-and-reduce summarization pipeline.

pub mod chunking;
pub mod reduce;

pub use chunking::split_document;
pub use reduce::{ReduceOptions, reduce};
