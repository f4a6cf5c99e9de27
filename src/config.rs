//! Configuration management and validation.
//!
//! Provides the configuration structure that drives the normalization
//! engine: file layout (header signature or fixed offsets), column
//! allowlists, delimiters, numeric detection strategy, malformed-row
//! policy and output settings.

use crate::constants::{
    CSV_EXTENSIONS, DEFAULT_HEADER_SIGNATURE, DEFAULT_MISSING_MARKER, DIRTY_COLUMNS,
    FIXED_HEADER_LINE, FIXED_MIN_LINES, INPUT_DELIMITER, METADATA_DELIMITER, NUMERIC_COLUMNS,
    NUMERIC_UNIT_SUFFIX, OUTPUT_DELIMITER, STATION_COLUMN, STATION_FILENAME_PATTERN,
    STATION_METADATA_KEY, STATION_METADATA_LINE,
};
use crate::encoding::TextEncoding;
use crate::error::{InmetError, Result};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Where the real tabular header sits inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderLayout {
    /// Scan for the first line starting with `signature`
    Signature { signature: String },
    /// Header always at `header_line` (0-based); files need `min_lines` lines
    FixedOffset { header_line: usize, min_lines: usize },
}

impl Default for HeaderLayout {
    fn default() -> Self {
        HeaderLayout::Signature {
            signature: DEFAULT_HEADER_SIGNATURE.to_string(),
        }
    }
}

impl HeaderLayout {
    /// The rigid export layout: header on line 9, at least 10 lines
    pub fn fixed() -> Self {
        HeaderLayout::FixedOffset {
            header_line: FIXED_HEADER_LINE,
            min_lines: FIXED_MIN_LINES,
        }
    }
}

/// Strategy deciding which fields receive decimal-comma conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericDetection {
    /// Only columns listed in `numeric_columns` are numeric
    #[default]
    ColumnSet,
    /// Listed columns plus any value matching the numeric-shape predicate
    ShapePredicate,
}

impl FromStr for NumericDetection {
    type Err = InmetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "column-set" | "column_set" | "columns" => Ok(NumericDetection::ColumnSet),
            "shape" | "shape-predicate" | "shape_predicate" | "predicate" => {
                Ok(NumericDetection::ShapePredicate)
            }
            other => Err(InmetError::configuration(format!(
                "Unknown numeric detection '{}' (expected column-set or shape)",
                other
            ))),
        }
    }
}

/// What to do with a data row whose width differs from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowWidthPolicy {
    /// Drop the row, count it and keep the rest of the file
    #[default]
    DropRow,
    /// Reject the whole file
    FailFile,
}

/// Consolidated output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Delimited UTF-8 text, numbers as decimal-point text
    #[default]
    Csv,
    /// Parquet with Float64 numeric columns
    Parquet,
}

impl OutputFormat {
    /// Infer the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        if ext == "parquet" {
            Some(OutputFormat::Parquet)
        } else if CSV_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(OutputFormat::Csv)
        } else {
            None
        }
    }
}

impl FromStr for OutputFormat {
    type Err = InmetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(InmetError::configuration(format!(
                "Unknown output format '{}' (expected csv or parquet)",
                other
            ))),
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = InmetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(InmetError::configuration(format!(
                "Unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                other
            ))),
        }
    }
}

/// Global configuration for INMET processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Candidate encodings, tried in order
    pub encodings: Vec<TextEncoding>,

    /// How the header line is located
    pub header_layout: HeaderLayout,

    /// 0-based metadata line whose second field names the station
    pub station_line: Option<usize>,

    /// Metadata key whose value names the station
    pub station_key: Option<String>,

    /// Regex with one capture group extracting the station from a file name
    pub station_filename_pattern: String,

    /// Delimiter of the source tables
    pub input_delimiter: char,

    /// Key/value separator in metadata lines
    pub metadata_delimiter: char,

    /// Delimiter of the CSV output
    pub output_delimiter: char,

    /// Name of the prepended station column
    pub station_column: String,

    /// Numeric detection strategy
    pub numeric_detection: NumericDetection,

    /// Columns always treated as numeric
    pub numeric_columns: Vec<String>,

    /// Descriptive columns that may contain stray delimiters
    pub dirty_columns: Vec<String>,

    /// Unit token accepted after digits by the shape predicate
    pub numeric_unit_suffix: String,

    /// Source values meaning "no observation" (e.g. `-9999`)
    pub missing_values: Vec<String>,

    /// Rendering of missing values in CSV output
    pub missing_marker: String,

    /// Broadcast metadata entries as constant columns
    pub include_metadata_columns: bool,

    /// Drop the empty column produced by a trailing delimiter
    pub drop_trailing_empty_column: bool,

    /// Malformed row handling
    pub row_width_policy: RowWidthPolicy,

    /// Output format
    pub output_format: OutputFormat,

    /// Parquet compression
    pub compression: CompressionAlgorithm,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            encodings: TextEncoding::default_candidates(),
            header_layout: HeaderLayout::default(),
            station_line: Some(STATION_METADATA_LINE),
            station_key: Some(STATION_METADATA_KEY.to_string()),
            station_filename_pattern: STATION_FILENAME_PATTERN.to_string(),
            input_delimiter: INPUT_DELIMITER,
            metadata_delimiter: METADATA_DELIMITER,
            output_delimiter: OUTPUT_DELIMITER,
            station_column: STATION_COLUMN.to_string(),
            numeric_detection: NumericDetection::default(),
            numeric_columns: NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
            dirty_columns: DIRTY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            numeric_unit_suffix: NUMERIC_UNIT_SUFFIX.to_string(),
            missing_values: Vec::new(),
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
            include_metadata_columns: false,
            drop_trailing_empty_column: true,
            row_width_policy: RowWidthPolicy::default(),
            output_format: OutputFormat::default(),
            compression: CompressionAlgorithm::default(),
        }
    }
}

impl ProcessorConfig {
    /// Use the given header layout
    pub fn with_header_layout(mut self, layout: HeaderLayout) -> Self {
        self.header_layout = layout;
        self
    }

    /// Scan for a custom header signature
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.header_layout = HeaderLayout::Signature {
            signature: signature.into(),
        };
        self
    }

    /// Set the station metadata line (None disables it)
    pub fn with_station_line(mut self, line: Option<usize>) -> Self {
        self.station_line = line;
        self
    }

    /// Set the station metadata key (None disables it)
    pub fn with_station_key(mut self, key: Option<String>) -> Self {
        self.station_key = key;
        self
    }

    /// Set the numeric detection strategy
    pub fn with_numeric_detection(mut self, detection: NumericDetection) -> Self {
        self.numeric_detection = detection;
        self
    }

    /// Add columns to the numeric allowlist
    pub fn with_numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add columns to the dirty-column allowlist
    pub fn with_dirty_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirty_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Set source sentinels that mean "missing"
    pub fn with_missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Enable metadata-derived constant columns
    pub fn with_metadata_columns(mut self) -> Self {
        self.include_metadata_columns = true;
        self
    }

    /// Set the malformed-row policy
    pub fn with_row_width_policy(mut self, policy: RowWidthPolicy) -> Self {
        self.row_width_policy = policy;
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the CSV output delimiter
    pub fn with_output_delimiter(mut self, delimiter: char) -> Self {
        self.output_delimiter = delimiter;
        self
    }

    /// Set the candidate encodings
    pub fn with_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.encodings.is_empty() {
            return Err(InmetError::configuration(
                "At least one candidate encoding is required",
            ));
        }

        match &self.header_layout {
            HeaderLayout::Signature { signature } if signature.is_empty() => {
                return Err(InmetError::configuration("Header signature is empty"));
            }
            HeaderLayout::FixedOffset {
                header_line,
                min_lines,
            } if *min_lines <= *header_line => {
                return Err(InmetError::configuration(format!(
                    "min_lines ({}) must exceed header_line ({})",
                    min_lines, header_line
                )));
            }
            _ => {}
        }

        for (name, delimiter) in [
            ("input", self.input_delimiter),
            ("output", self.output_delimiter),
        ] {
            if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' {
                return Err(InmetError::configuration(format!(
                    "Invalid {} delimiter {:?}: must be a single ASCII character other than quote or newline",
                    name, delimiter
                )));
            }
        }

        if self.station_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(InmetError::configuration("Station metadata key is empty"));
        }

        if self.station_column.trim().is_empty() {
            return Err(InmetError::configuration("Station column name is empty"));
        }

        regex::Regex::new(&self.station_filename_pattern).map_err(|e| {
            InmetError::configuration(format!("Invalid station file name pattern: {}", e))
        })?;

        Ok(())
    }

    /// Input delimiter as a byte for the CSV splitter
    pub fn input_delimiter_byte(&self) -> u8 {
        self.input_delimiter as u8
    }

    /// Output delimiter as a byte for the CSV writer
    pub fn output_delimiter_byte(&self) -> u8 {
        self.output_delimiter as u8
    }
}
