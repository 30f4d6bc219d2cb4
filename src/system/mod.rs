//! System abstraction for filesystem operations
//!
//! Chart discovery, values loading, `$ref` resolution and schema output all
//! go through this trait, so the whole pipeline can run against an in-memory
//! filesystem in tests.

use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Entry from directory walking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_file: bool,
    pub is_dir: bool,
}

/// Unified trait for filesystem operations
///
/// Implementations must be shareable across the synthesis worker threads.
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::fs` and `walkdir`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    /// Get the current working directory
    fn current_dir(&self) -> io::Result<PathBuf>;

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write bytes to a file, creating it if it doesn't exist
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path points to a file
    fn is_file(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Canonicalize a path (resolve to absolute path)
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Recursively walk a directory, returning all entries sorted by path
    ///
    /// The root itself is not part of the result.
    fn walk_dir(&self, path: &Path, follow_links: bool) -> io::Result<Vec<WalkEntry>>;
}
