#![deny(missing_docs)]

//! Core library for the docsum document summarizer.

/// Environment-driven configuration management.
pub mod config;
/// Document ingestion and text extraction.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Chunk-and-reduce summarization pipeline.
pub mod pipeline;
/// Remote summarization client and failure classification.
pub mod summarization;
