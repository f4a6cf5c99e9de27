//! INMET Processor Library
//!
//! A Rust library for consolidating INMET automatic weather-station CSV
//! exports into a single clean table ready for warehouse loading.
//!
//! This library provides tools for:
//! - Decoding exports of undeclared encoding (UTF-8, Latin-1, Windows-1252)
//! - Locating the real tabular header below the metadata preamble
//! - Resolving the station name from metadata or the file name
//! - Normalizing fields (quotes, stray delimiters, decimal commas, missing values)
//! - Merging many files under one header with a leading station column
//! - Writing the result as CSV or Parquet, atomically

pub mod cli;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod header;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod station;

// Re-export commonly used types
pub use config::{
    CompressionAlgorithm, HeaderLayout, NumericDetection, OutputFormat, ProcessorConfig,
    RowWidthPolicy,
};
pub use encoding::TextEncoding;
pub use error::{InmetError, Result};
pub use models::{Cell, ConsolidatedTable, ProcessingStats};
pub use processor::DatasetProcessor;
pub use processor::merger::DatasetMerger;
