//! Configuration management module
//!
//! Run configuration, synthesis options and chart descriptors

pub mod chart;
pub mod options;

pub use chart::{CHART_FILE_NAME, ChartFile, ChartType, Dependency};
pub use options::{SkipAutoGeneration, SynthesisOptions};

use crate::error::SchemaError;
use std::path::PathBuf;

/// Default values file name
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";

/// Default schema output file name
pub const DEFAULT_OUTPUT_FILE: &str = "values.schema.json";

/// Complete configuration of one generator run
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "Mirrors independent CLI switches")]
pub struct GenerateConfig {
    /// Directory searched recursively for charts
    pub chart_search_root: PathBuf,
    /// Print schemas instead of writing them
    pub dry_run: bool,
    /// Skip dependency sorting and composition
    pub no_dependencies: bool,
    /// Add a `yaml-language-server` schema reference to values files
    pub add_schema_reference: bool,
    /// Turn commented-out YAML into values before synthesis
    pub uncomment: bool,
    /// Candidate values file names, first existing one wins
    pub value_files: Vec<String>,
    /// Schema file name relative to each chart directory
    pub output_file: String,
    /// Only these dependencies are composed (empty selects all)
    pub dependencies_filter: Vec<String>,
    /// Dependency properties accept anything and are never required
    pub skip_dependencies_schema_validation: bool,
    /// Degrade to unsorted order instead of failing on cycles
    pub allow_circular_dependencies: bool,
    /// Size of the synthesis worker pool
    pub workers: usize,
    /// Annotate values files instead of generating schemas
    pub annotate: bool,
    pub synthesis: SynthesisOptions,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            chart_search_root: PathBuf::from("."),
            dry_run: false,
            no_dependencies: false,
            add_schema_reference: false,
            uncomment: false,
            value_files: vec![DEFAULT_VALUES_FILE.to_owned()],
            output_file: DEFAULT_OUTPUT_FILE.to_owned(),
            dependencies_filter: Vec::new(),
            skip_dependencies_schema_validation: false,
            allow_circular_dependencies: false,
            workers: default_workers(),
            annotate: false,
            synthesis: SynthesisOptions::default(),
        }
    }
}

/// Twice the available parallelism
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get().saturating_mul(2))
}

impl GenerateConfig {
    /// Check values that the flag parser cannot
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty file list, an empty output
    /// name or a zero-sized worker pool
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.workers == 0 {
            return Err(SchemaError::configuration("workers must be greater than 0"));
        }
        if self.value_files.iter().all(|name| name.trim().is_empty()) {
            return Err(SchemaError::configuration(
                "at least one values file name is required",
            ));
        }
        if self.output_file.trim().is_empty() {
            return Err(SchemaError::configuration("output file name must not be empty"));
        }
        Ok(())
    }

    /// True if the dependency filter selects `name`
    #[must_use]
    #[inline]
    pub fn dependency_selected(&self, name: &str) -> bool {
        self.dependencies_filter.is_empty() || self.dependencies_filter.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerateConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.workers >= 1);
        assert_eq!(config.value_files, ["values.yaml"]);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let config = GenerateConfig {
            workers: 0,
            ..GenerateConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchemaError::Configuration { .. })
        ));
    }

    #[test]
    fn test_dependency_filter() {
        let mut config = GenerateConfig::default();
        assert!(config.dependency_selected("redis"));
        config.dependencies_filter = vec!["postgres".to_owned()];
        assert!(!config.dependency_selected("redis"));
        assert!(config.dependency_selected("postgres"));
    }
}
