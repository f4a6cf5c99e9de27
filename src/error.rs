//! Error handling for INMET processing operations.
//!
//! Per-file variants (encoding, header, row width) are recoverable: the
//! merger converts them into a skipped file and keeps going. Run-level
//! variants (no usable files, output write failure, configuration) reach
//! the caller and decide the exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InmetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("No candidate encoding decodes file: {path} (tried {tried})")]
    EncodingUndetected { path: PathBuf, tried: String },

    #[error("Header line starting with '{signature}' not found in file: {path}")]
    HeaderNotFound { path: PathBuf, signature: String },

    #[error("File too short: {path} has {lines} lines, at least {required} required")]
    FileTooShort {
        path: PathBuf,
        lines: usize,
        required: usize,
    },

    #[error(
        "Row width mismatch in file {path} at line {line}: expected {expected} fields, found {found}"
    )]
    RowWidthMismatch {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("No records produced: all {files_seen} input files were skipped or empty")]
    NoFilesProcessed { files_seen: usize },

    #[error("Failed to write output {path}: {reason}")]
    OutputWriteFailure { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl InmetError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an output write failure for the given destination
    pub fn output_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OutputWriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the merger may skip the offending file and continue the run
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::NoFilesProcessed { .. }
                | Self::OutputWriteFailure { .. }
                | Self::Configuration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InmetError>;
