//! Main processing engine with modular architecture.
//!
//! Orchestrates the consolidation workflow: input deduplication, per-file
//! assembly and merging, then writing the consolidated table.

pub mod assembler;
pub mod discovery;
pub mod merger;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{merger::DatasetMerger, writer::TableWriter};

use crate::config::ProcessorConfig;
use crate::error::Result;
use crate::models::ProcessingStats;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Main processor for INMET export consolidation
#[derive(Debug)]
pub struct DatasetProcessor {
    output_path: PathBuf,
    merger: DatasetMerger,
    writer: TableWriter,
    show_progress: bool,
}

impl DatasetProcessor {
    /// Create a processor writing to `output_path` with the default configuration
    pub fn new(output_path: PathBuf) -> Result<Self> {
        Self::with_config(output_path, ProcessorConfig::default())
    }

    /// Create a processor with an explicit configuration
    pub fn with_config(output_path: PathBuf, config: ProcessorConfig) -> Result<Self> {
        let writer = TableWriter::from_config(&config);
        let merger = DatasetMerger::new(config)?;

        Ok(Self {
            output_path,
            merger,
            writer,
            show_progress: false,
        })
    }

    /// Show a progress bar while merging
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn config(&self) -> &ProcessorConfig {
        self.merger.config()
    }

    /// Consolidate `paths` into the output file
    pub fn process(&self, paths: &[PathBuf]) -> Result<ProcessingStats> {
        let start_time = Instant::now();

        let progress = if self.show_progress {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let outcome = self.merger.merge_with_progress(paths, &progress);
        progress.finish_and_clear();
        let outcome = outcome?;

        let output_bytes = self.writer.write(&outcome.table, &self.output_path)?;

        let stats = ProcessingStats {
            output_path: self.output_path.clone(),
            output_bytes,
            processing_time_ms: start_time.elapsed().as_millis(),
            ..outcome.stats
        };

        info!(
            "Wrote {} rows ({} bytes) to {} in {}ms",
            stats.total_rows,
            stats.output_bytes,
            stats.output_path.display(),
            stats.processing_time_ms
        );

        Ok(stats)
    }
}
