//! Encoding detection for station exports.
//!
//! Exports do not declare their encoding. The file is read once and each
//! candidate is tried in order against the cached bytes; the first one that
//! decodes the whole buffer without error wins. There is no lossy fallback.

use crate::error::{InmetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Text encodings a station export may be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// UTF-8 first, then the single-byte Western code pages
    pub fn default_candidates() -> Vec<Self> {
        vec![
            TextEncoding::Utf8,
            TextEncoding::Latin1,
            TextEncoding::Windows1252,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "iso-8859-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Decode the whole buffer, or `None` if any byte sequence is invalid
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = InmetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            "cp1252" | "windows-1252" | "windows1252" => Ok(TextEncoding::Windows1252),
            other => Err(InmetError::configuration(format!(
                "Unsupported encoding '{}'",
                other
            ))),
        }
    }
}

/// Return the first candidate that decodes `bytes` cleanly, with the text
pub fn detect_encoding(bytes: &[u8], candidates: &[TextEncoding]) -> Option<(TextEncoding, String)> {
    candidates
        .iter()
        .find_map(|encoding| encoding.decode(bytes).map(|text| (*encoding, text)))
}

/// A decoded station export, split into lines
#[derive(Debug, Clone)]
pub struct RawFile {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub lines: Vec<String>,
}

impl RawFile {
    /// Read and decode a file from disk
    pub fn read(path: &Path, candidates: &[TextEncoding]) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(path, &bytes, candidates)
    }

    /// Decode an in-memory buffer as if it had been read from `path`
    pub fn from_bytes(path: &Path, bytes: &[u8], candidates: &[TextEncoding]) -> Result<Self> {
        let (encoding, text) =
            detect_encoding(bytes, candidates).ok_or_else(|| InmetError::EncodingUndetected {
                path: path.to_path_buf(),
                tried: candidates
                    .iter()
                    .map(TextEncoding::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        debug!("Decoded {} as {}", path.display(), encoding);

        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let lines = text.lines().map(str::to_string).collect();

        Ok(Self {
            path: path.to_path_buf(),
            encoding,
            lines,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
