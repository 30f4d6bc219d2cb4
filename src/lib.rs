//! `chart-schema` - JSON Schema generation for Helm charts
//!
//! Builds a `values.schema.json` for every chart below a search root from its
//! annotated values file, then composes the schemas of charts that depend on
//! each other.

pub mod cli;
pub mod config;
pub mod error;
pub mod operations;
pub mod schema;
pub mod system;
pub mod utils;
pub mod values;

use anyhow::Result;
use config::GenerateConfig;
use operations::annotate::run_annotate;
use operations::generate::GenerateOperation;
use system::System;

/// Main entry point for the chart-schema library
///
/// # Errors
///
/// Returns an error if the run fails; the error downcasts to
/// [`error::SchemaError`] for the exit code
pub fn run(config: &GenerateConfig, system: &dyn System) -> Result<()> {
    if config.annotate {
        return run_annotate(system, config);
    }
    GenerateOperation::new(config, system).execute()
}
