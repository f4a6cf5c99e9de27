//! Station identity resolution.
//!
//! Every row of a file carries exactly one station name. It is resolved
//! from the designated metadata line, then the station metadata key, then
//! the file name pattern, and finally the bare file stem. Only lines before
//! the header count as metadata. The last step always succeeds.

use crate::config::ProcessorConfig;
use crate::error::{InmetError, Result};
use crate::header::Metadata;
use crate::normalize::{remove_embedded_delimiter, strip_quotes_and_whitespace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Which strategy produced the station name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationSource {
    MetadataLine,
    MetadataKey,
    FileName,
    FileStem,
}

/// Station name attached to every row of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationIdentity {
    pub name: String,
    pub source: StationSource,
}

/// Resolves station names for files using the configured conventions
#[derive(Debug, Clone)]
pub struct StationResolver {
    station_line: Option<usize>,
    station_key: Option<String>,
    delimiter: char,
    filename_pattern: Regex,
}

impl StationResolver {
    pub fn from_config(config: &ProcessorConfig) -> Result<Self> {
        let filename_pattern = Regex::new(&config.station_filename_pattern).map_err(|e| {
            InmetError::configuration(format!("Invalid station file name pattern: {}", e))
        })?;

        Ok(Self {
            station_line: config.station_line,
            station_key: config.station_key.clone(),
            delimiter: config.input_delimiter,
            filename_pattern,
        })
    }

    /// Resolve the station for a file from its metadata lines, parsed
    /// metadata and path
    pub fn resolve(
        &self,
        metadata_lines: &[String],
        metadata: &Metadata,
        path: &Path,
    ) -> StationIdentity {
        if let Some(name) = self.from_metadata_line(metadata_lines) {
            return StationIdentity {
                name,
                source: StationSource::MetadataLine,
            };
        }

        if let Some(name) = self.from_metadata_key(metadata) {
            debug!("Station for {} taken from metadata key", path.display());
            return StationIdentity {
                name,
                source: StationSource::MetadataKey,
            };
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(name) = self.from_file_name(&file_name) {
            debug!("Station for {} taken from file name", path.display());
            return StationIdentity {
                name,
                source: StationSource::FileName,
            };
        }

        debug!("Station for {} falls back to file stem", path.display());
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(file_name);

        StationIdentity {
            name: stem,
            source: StationSource::FileStem,
        }
    }

    /// Second delimited field of the designated metadata line (`ESTACAO:;NAME`)
    fn from_metadata_line(&self, lines: &[String]) -> Option<String> {
        let line = lines.get(self.station_line?)?;
        let field = line.trim().split(self.delimiter).nth(1)?;
        let name = strip_quotes_and_whitespace(field);
        (!name.is_empty()).then_some(name)
    }

    /// Value of the station key, `;NAME` cleaned to `NAME`
    fn from_metadata_key(&self, metadata: &Metadata) -> Option<String> {
        let value = metadata.get(self.station_key.as_deref()?)?;
        let name = strip_quotes_and_whitespace(&remove_embedded_delimiter(value, self.delimiter));
        (!name.is_empty()).then_some(name)
    }

    fn from_file_name(&self, file_name: &str) -> Option<String> {
        let captures = self.filename_pattern.captures(file_name)?;
        let name = captures.get(1)?.as_str().trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}
