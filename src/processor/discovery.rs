//! File discovery for INMET exports
//!
//! Expands input arguments (files, directories or glob patterns) into the
//! list of candidate CSV files, and collapses paths that name the same
//! file more than once.

use crate::constants::CSV_EXTENSIONS;
use crate::error::{InmetError, Result};
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// File discovery component for INMET exports
#[derive(Debug)]
pub struct FileDiscovery {
    inputs: Vec<String>,
}

impl FileDiscovery {
    /// Create a new file discovery instance
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand every input into candidate files
    ///
    /// A directory contributes its `*.csv` and `*.CSV` entries (not
    /// recursive), an existing file is taken as is, anything else is read
    /// as a glob pattern. Inputs matching nothing are skipped with a
    /// warning. The result may still contain the same file twice; see
    /// [`dedup_paths`].
    pub fn discover_csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in &self.inputs {
            let path = Path::new(input);

            if path.is_dir() {
                let found = discover_in_directory(path)?;
                debug!("Found {} CSV files in {}", found.len(), path.display());
                if found.is_empty() {
                    warn!("No CSV files in directory {}", path.display());
                }
                files.extend(found);
            } else if path.is_file() {
                files.push(path.to_path_buf());
            } else {
                let found = expand_pattern(input)?;
                if found.is_empty() {
                    warn!("Input {} matched no files, skipping", input);
                }
                files.extend(found);
            }
        }

        debug!("Discovered {} candidate files", files.len());
        Ok(files)
    }
}

/// CSV files directly inside `directory`, both extension spellings
fn discover_in_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let escaped = Pattern::escape(&directory.to_string_lossy());
    let mut files = Vec::new();

    for extension in CSV_EXTENSIONS {
        let pattern = format!("{}/*.{}", escaped, extension);
        files.extend(expand_pattern(&pattern)?);
    }

    Ok(files)
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| {
        InmetError::configuration(format!("Invalid input pattern '{}': {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Unreadable path while expanding {}: {}", pattern, e),
        }
    }

    Ok(files)
}

/// Case-insensitive identity of a path
///
/// Uses the canonical path when the file exists, otherwise a lexical
/// normalization (`.` removed, `..` folded), then lowercases.
pub fn path_key(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| lexical_normalize(path));
    resolved.to_string_lossy().to_lowercase()
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_in_name = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if ends_in_name {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Remove paths naming an already-seen file, keeping first occurrences
///
/// Returns the surviving paths sorted, plus the number removed.
pub fn dedup_paths(paths: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut seen = HashSet::new();
    let mut unique: Vec<PathBuf> = paths
        .iter()
        .filter(|path| seen.insert(path_key(path)))
        .cloned()
        .collect();

    let removed = paths.len() - unique.len();
    if removed > 0 {
        debug!("Removed {} duplicate input paths", removed);
    }

    unique.sort();
    (unique, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_inputs(temp_dir: &TempDir) -> PathBuf {
        let dir = temp_dir.path().join("inmet");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("A301.csv"), "x").unwrap();
        fs::write(dir.join("A322.CSV"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join("nested").join("A999.csv"), "x").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_discover_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = create_inputs(&temp_dir);

        let discovery = FileDiscovery::new([dir.to_string_lossy().to_string()]);
        let files = discovery.discover_csv_files().unwrap();

        // Both extension spellings, no recursion, no other extensions
        assert_eq!(names(&files), vec!["A301.csv", "A322.CSV"]);
    }

    #[test]
    fn test_discover_file_and_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let dir = create_inputs(&temp_dir);

        let file = dir.join("A301.csv").to_string_lossy().to_string();
        let pattern = format!("{}/nested/*.csv", dir.to_string_lossy());

        let files = FileDiscovery::new([file, pattern]).discover_csv_files().unwrap();
        assert_eq!(names(&files), vec!["A301.csv", "A999.csv"]);
    }

    #[test]
    fn test_discover_missing_input_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing").to_string_lossy().to_string();

        let files = FileDiscovery::new([missing]).discover_csv_files().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let result = FileDiscovery::new(["data/[unclosed"]).discover_csv_files();
        assert!(matches!(result, Err(InmetError::Configuration { .. })));
    }

    #[test]
    fn test_dedup_case_and_lexical_variants() {
        let paths = vec![
            PathBuf::from("data/b.csv"),
            PathBuf::from("data/./A.CSV"),
            PathBuf::from("data/sub/../a.csv"),
            PathBuf::from("DATA/B.csv"),
        ];

        let (unique, removed) = dedup_paths(&paths);
        assert_eq!(removed, 2);
        assert_eq!(
            unique,
            vec![PathBuf::from("data/./A.CSV"), PathBuf::from("data/b.csv")]
        );
    }

    #[test]
    fn test_dedup_existing_file_reached_twice() {
        let temp_dir = TempDir::new().unwrap();
        let dir = create_inputs(&temp_dir);

        let direct = dir.join("A301.csv");
        let roundabout = dir.join("nested").join("..").join("A301.csv");

        let (unique, removed) = dedup_paths(&[direct.clone(), roundabout]);
        assert_eq!(removed, 1);
        assert_eq!(unique, vec![direct]);
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("./a/b/../c.csv")),
            PathBuf::from("a/c.csv")
        );
        assert_eq!(
            lexical_normalize(Path::new("../x.csv")),
            PathBuf::from("../x.csv")
        );
    }
}
