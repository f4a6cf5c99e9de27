//! Row assembly for a single station export.
//!
//! Turns the header and data lines of one file into uniform-width
//! normalized records: splits each line on the table delimiter
//! (quote-aware, one physical line per record), repairs rows widened by
//! stray delimiters in a dirty column, applies the field normalizer and
//! prepends the station cell.

use crate::config::{ProcessorConfig, RowWidthPolicy};
use crate::encoding::TextEncoding;
use crate::error::{InmetError, Result};
use crate::header::{FileSections, Metadata};
use crate::models::{Cell, FileBatch, FileStats, NormalizedRecord};
use crate::normalize::{FieldNormalizer, strip_quotes_and_whitespace};
use crate::station::StationIdentity;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Column names parsed from a header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    pub columns: Vec<String>,
}

impl HeaderBlock {
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// Builds normalized records from one file's sections
pub struct RowAssembler<'a> {
    config: &'a ProcessorConfig,
    normalizer: &'a FieldNormalizer,
    splitter: ReaderBuilder,
}

impl<'a> RowAssembler<'a> {
    pub fn new(config: &'a ProcessorConfig, normalizer: &'a FieldNormalizer) -> Self {
        let mut splitter = ReaderBuilder::new();
        splitter
            .has_headers(false)
            .flexible(true)
            .delimiter(config.input_delimiter_byte());

        Self {
            config,
            normalizer,
            splitter,
        }
    }

    /// Split one physical line into raw cells
    ///
    /// A delimiter inside a quoted value does not split it; an unterminated
    /// quote only affects its own line.
    pub fn split_line(&self, line: &str) -> Vec<String> {
        let mut reader = self.splitter.from_reader(line.as_bytes());
        let mut record = StringRecord::new();

        match reader.read_record(&mut record) {
            Ok(true) => record.iter().map(str::to_string).collect(),
            Ok(false) => Vec::new(),
            Err(e) => {
                debug!("Falling back to plain split for line: {}", e);
                line.split(self.config.input_delimiter)
                    .map(str::to_string)
                    .collect()
            }
        }
    }

    /// Parse the header line into unique, cleaned column names
    pub fn parse_header(&self, line: &str) -> HeaderBlock {
        let mut names: Vec<String> = self
            .split_line(line)
            .iter()
            .map(|cell| strip_quotes_and_whitespace(cell))
            .collect();

        if self.config.drop_trailing_empty_column
            && names.len() > 1
            && names.last().is_some_and(|name| name.is_empty())
        {
            names.pop();
        }

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(self.config.station_column.clone());

        let columns = names
            .into_iter()
            .map(|name| {
                if seen.insert(name.clone()) {
                    return name;
                }
                let mut suffix = 2;
                loop {
                    let candidate = format!("{}_{}", name, suffix);
                    if seen.insert(candidate.clone()) {
                        warn!("Duplicate column '{}' renamed to '{}'", name, candidate);
                        return candidate;
                    }
                    suffix += 1;
                }
            })
            .collect();

        HeaderBlock { columns }
    }

    /// Assemble every data line of a file into normalized records
    pub fn assemble(
        &self,
        path: &Path,
        encoding: TextEncoding,
        sections: &FileSections<'_>,
        station: StationIdentity,
        metadata: &Metadata,
    ) -> Result<FileBatch> {
        let header = self.parse_header(sections.header);
        let width = header.width();
        let dirty_indices: Vec<usize> = header
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| self.normalizer.is_dirty_column(name))
            .map(|(index, _)| index)
            .collect();

        let mut stats = FileStats {
            data_lines: sections.data.len(),
            ..Default::default()
        };

        let mut columns = Vec::with_capacity(width + 1 + metadata.len());
        columns.push(self.config.station_column.clone());
        columns.extend(header.columns.iter().cloned());

        let mut constant_cells = Vec::new();
        if self.config.include_metadata_columns {
            for (key, value) in metadata.iter() {
                if columns.iter().any(|column| column == key) {
                    warn!(
                        "Metadata key '{}' in {} collides with a column, skipped",
                        key,
                        path.display()
                    );
                    continue;
                }
                let (cell, coerced) = self.normalizer.normalize_tracked(key, value);
                if coerced {
                    stats.values_coerced += 1;
                }
                columns.push(key.to_string());
                constant_cells.push(cell);
            }
        }

        let station_cell = Cell::Text(station.name.clone());
        let mut records = Vec::with_capacity(sections.data.len());

        for (offset, line) in sections.data.iter().enumerate() {
            // 1-based line number in the source file
            let line_number = sections.header_index + offset + 2;

            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }

            let mut cells = self.split_line(line);

            if self.config.drop_trailing_empty_column
                && cells.len() == width + 1
                && cells
                    .last()
                    .is_some_and(|cell| strip_quotes_and_whitespace(cell).is_empty())
            {
                cells.pop();
            }

            if cells.len() > width {
                if let [dirty_index] = dirty_indices[..] {
                    rejoin_dirty_cells(&mut cells, dirty_index, width);
                    stats.rows_repaired += 1;
                    debug!(
                        "Re-joined stray delimiters in column '{}' at {}:{}",
                        header.columns[dirty_index],
                        path.display(),
                        line_number
                    );
                }
            }

            if cells.len() != width {
                match self.config.row_width_policy {
                    RowWidthPolicy::DropRow => {
                        stats.rows_dropped += 1;
                        debug!(
                            "Dropped row at {}:{}: expected {} fields, found {}",
                            path.display(),
                            line_number,
                            width,
                            cells.len()
                        );
                        continue;
                    }
                    RowWidthPolicy::FailFile => {
                        return Err(InmetError::RowWidthMismatch {
                            path: path.to_path_buf(),
                            line: line_number,
                            expected: width,
                            found: cells.len(),
                        });
                    }
                }
            }

            let mut record_cells = Vec::with_capacity(columns.len());
            record_cells.push(station_cell.clone());
            for (column, raw) in header.columns.iter().zip(&cells) {
                let (cell, coerced) = self.normalizer.normalize_tracked(column, raw);
                if coerced {
                    stats.values_coerced += 1;
                }
                record_cells.push(cell);
            }
            record_cells.extend(constant_cells.iter().cloned());

            records.push(NormalizedRecord::new(record_cells));
        }

        stats.rows_emitted = records.len();

        if stats.rows_dropped > 0 {
            warn!(
                "Dropped {} malformed rows from {}",
                stats.rows_dropped,
                path.display()
            );
        }

        Ok(FileBatch {
            path: path.to_path_buf(),
            encoding,
            station,
            columns,
            records,
            stats,
        })
    }
}

/// Merge the surplus cells following `dirty_index` back into it
fn rejoin_dirty_cells(cells: &mut Vec<String>, dirty_index: usize, width: usize) {
    let surplus = cells.len() - width;
    let merged: String = cells[dirty_index..=dirty_index + surplus].concat();
    cells.splice(dirty_index..=dirty_index + surplus, [merged]);
}
