//! Error handling module
//!
//! Defines the error taxonomy of schema generation with exit codes

pub mod types;

pub use types::*;
