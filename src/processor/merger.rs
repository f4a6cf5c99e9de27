//! Multi-file merge.
//!
//! Runs every input through decoding, header location, station resolution
//! and row assembly, then concatenates the resulting batches into one
//! consolidated table. Files that fail individually are recorded and
//! skipped; the run only fails when nothing usable remains.

use super::assembler::RowAssembler;
use super::discovery::dedup_paths;
use crate::config::ProcessorConfig;
use crate::encoding::RawFile;
use crate::error::{InmetError, Result};
use crate::header::{Metadata, split_sections};
use crate::models::{ConsolidatedTable, FileBatch, ProcessingStats, SkippedFile};
use crate::normalize::FieldNormalizer;
use crate::station::StationResolver;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Consolidated rows together with the run statistics gathered so far
#[derive(Debug)]
pub struct MergeOutcome {
    pub table: ConsolidatedTable,
    pub stats: ProcessingStats,
}

/// Merges INMET exports into a single table
#[derive(Debug, Clone)]
pub struct DatasetMerger {
    config: ProcessorConfig,
    normalizer: FieldNormalizer,
    stations: StationResolver,
}

impl DatasetMerger {
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = FieldNormalizer::from_config(&config)?;
        let stations = StationResolver::from_config(&config)?;

        Ok(Self {
            config,
            normalizer,
            stations,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Read, decode and assemble one file
    pub fn process_file(&self, path: &Path) -> Result<FileBatch> {
        let raw = RawFile::read(path, &self.config.encodings)?;
        self.process_raw(&raw)
    }

    /// Assemble an already decoded file
    pub fn process_raw(&self, raw: &RawFile) -> Result<FileBatch> {
        let sections = split_sections(&raw.lines, &self.config.header_layout, &raw.path)?;
        let metadata = Metadata::parse(sections.metadata, self.config.metadata_delimiter);
        let station = self.stations.resolve(sections.metadata, &metadata, &raw.path);

        debug!(
            "Station '{}' ({:?}) for {}",
            station.name,
            station.source,
            raw.path.display()
        );

        RowAssembler::new(&self.config, &self.normalizer).assemble(
            &raw.path,
            raw.encoding,
            &sections,
            station,
            &metadata,
        )
    }

    /// Merge `paths` without progress reporting
    pub fn merge(&self, paths: &[PathBuf]) -> Result<MergeOutcome> {
        self.merge_with_progress(paths, &ProgressBar::hidden())
    }

    /// Merge `paths` in sorted order, advancing `progress` once per file
    pub fn merge_with_progress(
        &self,
        paths: &[PathBuf],
        progress: &ProgressBar,
    ) -> Result<MergeOutcome> {
        let (files, duplicates_removed) = dedup_paths(paths);
        if duplicates_removed > 0 {
            info!(
                "Ignoring {} duplicate paths ({} unique files)",
                duplicates_removed,
                files.len()
            );
        }

        let mut stats = ProcessingStats {
            files_seen: paths.len(),
            duplicates_removed,
            ..Default::default()
        };
        let mut table = ConsolidatedTable::new();

        progress.set_length(files.len() as u64);

        for path in &files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            progress.set_message(name);

            match self.process_file(path) {
                Ok(batch) => {
                    info!(
                        "{}: {} rows, station {}, encoding {}",
                        path.display(),
                        batch.stats.rows_emitted,
                        batch.station.name,
                        batch.encoding
                    );
                    stats.files_processed += 1;
                    stats.rows_dropped += batch.stats.rows_dropped;
                    stats.rows_repaired += batch.stats.rows_repaired;
                    stats.values_coerced += batch.stats.values_coerced;
                    table.append(batch);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", path.display(), e);
                    stats.files_failed += 1;
                    stats.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }

            progress.inc(1);
        }

        if table.is_empty() {
            return Err(InmetError::NoFilesProcessed {
                files_seen: paths.len(),
            });
        }

        stats.total_rows = table.row_count();
        stats.schema = table.columns().to_vec();

        info!(
            "Merged {} rows from {} files ({} skipped)",
            stats.total_rows, stats.files_processed, stats.files_failed
        );

        Ok(MergeOutcome { table, stats })
    }
}
