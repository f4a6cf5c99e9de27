//! Core data structures and types for INMET processing.
//!
//! Defines normalized cells and records, per-file batches and statistics,
//! the consolidated table and the run-level processing report.

use crate::encoding::TextEncoding;
use crate::station::StationIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One normalized cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// Cleaned descriptive text
    Text(String),
    /// Numeric value; `text` keeps the decimal-point form of the source
    Number { text: String, value: f64 },
    /// Explicit missing value, distinct from zero and from empty text
    Missing,
}

impl Cell {
    /// Textual rendering, with `missing` standing in for missing values
    pub fn as_text<'a>(&'a self, missing: &'a str) -> &'a str {
        match self {
            Cell::Text(text) | Cell::Number { text, .. } => text,
            Cell::Missing => missing,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// One output row: station cell first, then one cell per file column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub cells: Vec<Cell>,
}

impl NormalizedRecord {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// Per-file assembly statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Lines following the header, blank ones included
    pub data_lines: usize,
    pub blank_lines: usize,
    pub rows_emitted: usize,
    /// Rows whose width could not be matched to the header
    pub rows_dropped: usize,
    /// Rows fixed by re-joining cells of a dirty column
    pub rows_repaired: usize,
    /// Numeric-column values that failed to parse and became missing
    pub values_coerced: usize,
}

/// Everything one file contributes to the consolidated table
#[derive(Debug, Clone)]
pub struct FileBatch {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub station: StationIdentity,
    /// Column names, station column first
    pub columns: Vec<String>,
    pub records: Vec<NormalizedRecord>,
    pub stats: FileStats,
}

/// A file left out of the run, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Rows of all processed files under one shared header
///
/// The schema starts as the first appended file's columns; columns first
/// seen in later files are appended. Rows appended before a column existed
/// read as missing in that column.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl ConsolidatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file's records, aligning its columns by name
    pub fn append(&mut self, batch: FileBatch) {
        let mapping: Vec<usize> = batch
            .columns
            .iter()
            .map(|name| self.column_index_or_insert(name))
            .collect();

        for record in batch.records {
            let mut row = vec![Cell::Missing; self.columns.len()];
            for (cell, &target) in record.cells.into_iter().zip(&mapping) {
                row[target] = cell;
            }
            self.rows.push(row);
        }
    }

    fn column_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), index);
        index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `column`), missing when the row predates the column
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        static MISSING: Cell = Cell::Missing;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&MISSING)
    }

    /// Iterate rows padded to the full schema width
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = &Cell>> + '_ {
        let width = self.columns.len();
        (0..self.rows.len()).map(move |row| (0..width).map(move |column| self.cell(row, column)))
    }
}

/// Outcome of a consolidation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Input paths before deduplication
    pub files_seen: usize,
    pub duplicates_removed: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub skipped: Vec<SkippedFile>,
    pub total_rows: usize,
    pub rows_dropped: usize,
    pub rows_repaired: usize,
    pub values_coerced: usize,
    /// Output header
    pub schema: Vec<String>,
    pub output_path: PathBuf,
    pub output_bytes: u64,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationSource;

    fn batch(station: &str, columns: &[&str], rows: &[&[&str]]) -> FileBatch {
        FileBatch {
            path: PathBuf::from(format!("{}.csv", station)),
            encoding: TextEncoding::Utf8,
            station: StationIdentity {
                name: station.to_string(),
                source: StationSource::FileStem,
            },
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: rows
                .iter()
                .map(|row| {
                    NormalizedRecord::new(row.iter().map(|v| Cell::Text(v.to_string())).collect())
                })
                .collect(),
            stats: FileStats::default(),
        }
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(Cell::Text("abc".into()).as_text(""), "abc");
        let number = Cell::Number {
            text: "23.5".into(),
            value: 23.5,
        };
        assert_eq!(number.as_text(""), "23.5");
        assert_eq!(number.as_f64(), Some(23.5));
        assert_eq!(Cell::Missing.as_text("NULL"), "NULL");
        assert!(Cell::Missing.is_missing());
        assert_eq!(Cell::Text("1".into()).as_f64(), None);
    }

    #[test]
    fn test_table_appends_in_order() {
        let mut table = ConsolidatedTable::new();
        table.append(batch("A", &["STATION", "Data"], &[&["A", "d1"], &["A", "d2"]]));
        table.append(batch("B", &["STATION", "Data"], &[&["B", "d3"]]));

        assert_eq!(table.columns(), &["STATION", "Data"]);
        assert_eq!(table.row_count(), 3);
        let stations: Vec<_> = (0..3).map(|r| table.cell(r, 0).as_text("")).collect();
        assert_eq!(stations, vec!["A", "A", "B"]);
    }

    #[test]
    fn test_table_union_by_name() {
        let mut table = ConsolidatedTable::new();
        table.append(batch("A", &["STATION", "Data", "X"], &[&["A", "d1", "x1"]]));
        table.append(batch("B", &["STATION", "Y", "Data"], &[&["B", "y2", "d2"]]));

        assert_eq!(table.columns(), &["STATION", "Data", "X", "Y"]);
        let rows: Vec<Vec<String>> = table
            .rows()
            .map(|row| row.map(|c| c.as_text("-").to_string()).collect())
            .collect();
        assert_eq!(rows[0], vec!["A", "d1", "x1", "-"]);
        assert_eq!(rows[1], vec!["B", "d2", "-", "y2"]);
    }
}
