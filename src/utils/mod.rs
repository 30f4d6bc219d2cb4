//! Utility modules for path and file handling

pub mod fs;
pub mod path;
