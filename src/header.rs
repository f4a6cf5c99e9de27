//! Header location and metadata extraction.
//!
//! Splits a decoded export into the free-text metadata lines, the real
//! tabular header and the data lines, and parses the metadata lines into
//! `key: value` pairs.

use crate::config::HeaderLayout;
use crate::error::{InmetError, Result};
use std::path::Path;
use tracing::debug;

/// Borrowed view of a file split around its header line
#[derive(Debug, Clone, Copy)]
pub struct FileSections<'a> {
    pub metadata: &'a [String],
    pub header: &'a str,
    pub data: &'a [String],
    /// 0-based index of the header line
    pub header_index: usize,
}

/// Index of the first line starting with `signature`
pub fn find_header_line(lines: &[String], signature: &str) -> Option<usize> {
    lines.iter().position(|line| line.starts_with(signature))
}

/// Split decoded lines into metadata, header and data sections
pub fn split_sections<'a>(
    lines: &'a [String],
    layout: &HeaderLayout,
    path: &Path,
) -> Result<FileSections<'a>> {
    let header_index = match layout {
        HeaderLayout::Signature { signature } => find_header_line(lines, signature)
            .ok_or_else(|| InmetError::HeaderNotFound {
                path: path.to_path_buf(),
                signature: signature.clone(),
            })?,
        HeaderLayout::FixedOffset {
            header_line,
            min_lines,
        } => {
            let required = (*min_lines).max(header_line + 1);
            if lines.len() < required {
                return Err(InmetError::FileTooShort {
                    path: path.to_path_buf(),
                    lines: lines.len(),
                    required,
                });
            }
            *header_line
        }
    };

    debug!(
        "Header of {} at line {} ({} metadata lines, {} data lines)",
        path.display(),
        header_index + 1,
        header_index,
        lines.len() - header_index - 1
    );

    Ok(FileSections {
        metadata: &lines[..header_index],
        header: &lines[header_index],
        data: &lines[header_index + 1..],
        header_index,
    })
}

/// Key/value pairs harvested from the metadata lines, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Parse metadata lines, splitting each on the first `delimiter`
    ///
    /// Lines without the delimiter or with an empty key are ignored. A
    /// repeated key keeps its first position and takes the last value.
    pub fn parse(lines: &[String], delimiter: char) -> Self {
        let mut metadata = Metadata::default();

        for line in lines {
            let Some((key, value)) = line.split_once(delimiter) else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            metadata.insert(key, value.trim());
        }

        metadata
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
