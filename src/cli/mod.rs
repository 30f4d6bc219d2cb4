//! Command-line interface module
//!
//! Handles argument parsing and conversion into the run configuration

pub mod args;

pub use args::*;
