//! Integration tests for the processor module
//!
//! Tests the complete consolidation pipeline against small INMET-style
//! exports written to temporary directories.

pub mod multi_station;

use std::fs;
use std::path::{Path, PathBuf};

/// Eight metadata lines as found at the top of an automatic-station export
pub fn inmet_preamble(station: &str) -> String {
    format!(
        "REGIAO:;NE\n\
         UF:;PE\n\
         ESTACAO:;{}\n\
         CODIGO (WMO):;A322\n\
         LATITUDE:;-8,91\n\
         LONGITUDE:;-36,49\n\
         ALTITUDE:;827,8\n\
         DATA DE FUNDACAO:;2007-09-20\n",
        station
    )
}

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
