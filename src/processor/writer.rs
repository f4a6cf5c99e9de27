//! Output writing for the consolidated table
//!
//! Writes CSV (numbers as decimal-point text, missing values as the
//! configured marker) or Parquet (Float64 for all-numeric columns, String
//! otherwise). Output goes to a temporary file in the destination
//! directory and is renamed into place, so a failed run never leaves a
//! partial file behind.

use crate::config::{CompressionAlgorithm, OutputFormat, ProcessorConfig};
use crate::error::{InmetError, Result};
use crate::models::{Cell, ConsolidatedTable};

use polars::prelude::{Column, DataFrame, ParquetWriter as PolarsParquetWriter};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Writer for consolidated tables
#[derive(Debug, Clone)]
pub struct TableWriter {
    format: OutputFormat,
    delimiter: u8,
    missing_marker: String,
    compression: CompressionAlgorithm,
    numeric_columns: HashSet<String>,
}

impl TableWriter {
    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self {
            format: config.output_format,
            delimiter: config.output_delimiter_byte(),
            missing_marker: config.missing_marker.clone(),
            compression: config.compression,
            numeric_columns: config.numeric_columns.iter().cloned().collect(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write `table` to `output_path` atomically, returning the bytes written
    pub fn write(&self, table: &ConsolidatedTable, output_path: &Path) -> Result<u64> {
        let parent = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(parent).map_err(|e| InmetError::output_write(output_path, e))?;

        let mut temp =
            NamedTempFile::new_in(parent).map_err(|e| InmetError::output_write(output_path, e))?;

        debug!(
            "Writing {} rows as {:?} via {}",
            table.row_count(),
            self.format,
            temp.path().display()
        );

        let written = match self.format {
            OutputFormat::Csv => self.write_csv(table, temp.as_file_mut()),
            OutputFormat::Parquet => self.write_parquet(table, temp.as_file_mut()),
        };
        written.map_err(|e| InmetError::output_write(output_path, e))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| InmetError::output_write(output_path, e))?;

        let file = temp
            .persist(output_path)
            .map_err(|e| InmetError::output_write(output_path, e.error))?;

        let bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
        debug!("Wrote {} bytes to {}", bytes, output_path.display());
        Ok(bytes)
    }

    fn write_csv<W: Write>(&self, table: &ConsolidatedTable, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        csv_writer.write_record(table.columns())?;
        for row in table.rows() {
            csv_writer.write_record(row.map(|cell| cell.as_text(&self.missing_marker)))?;
        }
        csv_writer.flush()?;

        Ok(())
    }

    fn write_parquet(&self, table: &ConsolidatedTable, file: &mut File) -> Result<()> {
        let mut df = self.build_dataframe(table)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .finish(&mut df)?;
        Ok(())
    }

    /// Typed frame: Float64 where every present cell is a number, String otherwise
    pub fn build_dataframe(&self, table: &ConsolidatedTable) -> Result<DataFrame> {
        let rows = table.row_count();
        let mut columns = Vec::with_capacity(table.columns().len());

        for (index, name) in table.columns().iter().enumerate() {
            let cells: Vec<&Cell> = (0..rows).map(|row| table.cell(row, index)).collect();

            let only_numbers = cells
                .iter()
                .all(|cell| matches!(cell, Cell::Number { .. } | Cell::Missing));
            let any_number = cells.iter().any(|cell| matches!(cell, Cell::Number { .. }));

            let column = if only_numbers && (any_number || self.numeric_columns.contains(name)) {
                let values: Vec<Option<f64>> = cells.iter().map(|cell| cell.as_f64()).collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<&str>> = cells
                    .iter()
                    .map(|cell| match cell {
                        Cell::Missing => None,
                        other => Some(other.as_text("")),
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            };

            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }
}
