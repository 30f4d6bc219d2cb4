//! Real system implementation using `std::fs` and `walkdir`

use super::{System, WalkEntry};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Production implementation of System trait
///
/// Delegates directly to the standard library; directory walking uses
/// `walkdir`.
#[derive(Debug, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    /// Create a new `RealSystem` instance
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RealSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RealSystem {
    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn is_file(&self, path: &Path) -> io::Result<bool> {
        Ok(path.is_file())
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(path.is_dir())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn walk_dir(&self, path: &Path, follow_links: bool) -> io::Result<Vec<WalkEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .follow_links(follow_links)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            let file_type = entry.file_type();
            entries.push(WalkEntry {
                is_file: file_type.is_file(),
                is_dir: file_type.is_dir(),
                path: entry.into_path(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_walk_dir_lists_nested_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("charts/sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Chart.yaml"), "name: sub\n").unwrap();

        let system = RealSystem::new();
        let entries = system.walk_dir(temp.path(), false).unwrap();

        assert!(entries.iter().any(|e| e.is_dir && e.path.ends_with("charts/sub")));
        assert!(
            entries
                .iter()
                .any(|e| e.is_file && e.path.ends_with("sub/Chart.yaml"))
        );
        assert!(entries.iter().all(|e| e.path != temp.path()));
    }
}
