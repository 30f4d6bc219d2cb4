use crate::config::{
    DEFAULT_OUTPUT_FILE, DEFAULT_VALUES_FILE, GenerateConfig, SkipAutoGeneration, SynthesisOptions,
    default_workers,
};
use crate::error::SchemaError;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for chart-schema
///
/// Every flag can also be set through a `CHART_SCHEMA_<FLAG>` environment
/// variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "chart-schema")]
#[command(about = "Generate JSON Schema files for Helm charts from annotated values files")]
#[command(long_about = None)]
#[command(version)]
#[expect(clippy::struct_excessive_bools, reason = "One field per CLI switch")]
pub struct Args {
    /// Directory to search recursively for charts
    #[arg(
        short = 'c',
        long,
        value_name = "DIR",
        default_value = ".",
        env = "CHART_SCHEMA_CHART_SEARCH_ROOT"
    )]
    pub chart_search_root: PathBuf,

    /// Print schemas to stdout instead of writing files
    #[arg(short = 'd', long, env = "CHART_SCHEMA_DRY_RUN")]
    pub dry_run: bool,

    /// Do not order or compose chart dependencies
    #[arg(short = 'n', long, env = "CHART_SCHEMA_NO_DEPENDENCIES")]
    pub no_dependencies: bool,

    /// Add a yaml-language-server schema reference to each values file
    #[arg(short = 'r', long, env = "CHART_SCHEMA_ADD_SCHEMA_REFERENCE")]
    pub add_schema_reference: bool,

    /// Keep every comment paragraph above a key (default: only the one touching it)
    #[arg(short = 's', long, env = "CHART_SCHEMA_KEEP_FULL_COMMENT")]
    pub keep_full_comment: bool,

    /// Turn commented-out YAML into values before generating
    #[arg(short = 'u', long, env = "CHART_SCHEMA_UNCOMMENT")]
    pub uncomment: bool,

    /// Read helm-docs style `# --` comments
    #[arg(short = 'p', long, env = "CHART_SCHEMA_HELM_DOCS_COMPATIBILITY_MODE")]
    pub helm_docs_compatibility_mode: bool,

    /// Keep helm-docs `--` prefixes and `@tag` lines in descriptions
    #[arg(short = 'x', long, env = "CHART_SCHEMA_DONT_STRIP_HELM_DOCS_PREFIX")]
    pub dont_strip_helm_docs_prefix: bool,

    /// Do not add the `global` property to schemas
    #[arg(short = 'g', long, env = "CHART_SCHEMA_DONT_ADD_GLOBAL")]
    pub dont_add_global: bool,

    /// Values file names to look for, the first existing one is used
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        value_delimiter = ',',
        default_value = DEFAULT_VALUES_FILE,
        env = "CHART_SCHEMA_VALUE_FILES"
    )]
    pub value_files: Vec<String>,

    /// Schema file path relative to each chart directory
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        default_value = DEFAULT_OUTPUT_FILE,
        env = "CHART_SCHEMA_OUTPUT_FILE"
    )]
    pub output_file: String,

    /// Keywords not to generate automatically
    /// (type, title, description, required, default, additionalProperties)
    #[arg(
        short = 'k',
        long,
        value_name = "FIELD",
        value_delimiter = ',',
        env = "CHART_SCHEMA_SKIP_AUTO_GENERATION"
    )]
    pub skip_auto_generation: Vec<String>,

    /// Only compose these dependencies
    #[arg(
        short = 'i',
        long,
        value_name = "NAME",
        value_delimiter = ',',
        env = "CHART_SCHEMA_DEPENDENCIES_FILTER"
    )]
    pub dependencies_filter: Vec<String>,

    /// Accept any value for dependencies and never require them
    #[arg(short = 'm', long, env = "CHART_SCHEMA_SKIP_DEPENDENCIES_SCHEMA_VALIDATION")]
    pub skip_dependencies_schema_validation: bool,

    /// Keep going in unsorted order when dependencies form a cycle
    #[arg(short = 'a', long, env = "CHART_SCHEMA_ALLOW_CIRCULAR_DEPENDENCIES")]
    pub allow_circular_dependencies: bool,

    /// Number of synthesis workers (default: twice the available parallelism)
    #[arg(short = 'w', long, value_name = "N", env = "CHART_SCHEMA_WORKERS")]
    pub workers: Option<usize>,

    /// Annotate values files with `@schema` type blocks instead of generating schemas
    #[arg(long, env = "CHART_SCHEMA_ANNOTATE")]
    pub annotate: bool,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[arg(
        short = 'l',
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "CHART_SCHEMA_LOG_LEVEL"
    )]
    pub log_level: String,
}

impl Args {
    /// Build the run configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown skip fields or invalid values
    pub fn into_config(self) -> Result<GenerateConfig, SchemaError> {
        let skip = SkipAutoGeneration::from_fields(&self.skip_auto_generation)?;
        let config = GenerateConfig {
            chart_search_root: self.chart_search_root,
            dry_run: self.dry_run,
            no_dependencies: self.no_dependencies,
            add_schema_reference: self.add_schema_reference,
            uncomment: self.uncomment,
            value_files: self
                .value_files
                .into_iter()
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
            output_file: self.output_file,
            dependencies_filter: self
                .dependencies_filter
                .into_iter()
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
            skip_dependencies_schema_validation: self.skip_dependencies_schema_validation,
            allow_circular_dependencies: self.allow_circular_dependencies,
            workers: self.workers.unwrap_or_else(default_workers),
            annotate: self.annotate,
            synthesis: SynthesisOptions {
                keep_full_comment: self.keep_full_comment,
                helm_docs_compatibility: self.helm_docs_compatibility_mode,
                strip_helm_docs_prefix: !self.dont_strip_helm_docs_prefix,
                add_global: !self.dont_add_global,
                skip,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Args::try_parse_from(["chart-schema"]).unwrap().into_config().unwrap();
        assert_eq!(config.chart_search_root, PathBuf::from("."));
        assert_eq!(config.value_files, ["values.yaml"]);
        assert_eq!(config.output_file, "values.schema.json");
        assert!(config.synthesis.strip_helm_docs_prefix);
        assert!(config.synthesis.add_global);
    }

    #[test]
    fn test_flags() {
        let config = Args::try_parse_from([
            "chart-schema",
            "-c",
            "charts",
            "-f",
            "values.yml,values.yaml",
            "-k",
            "title,default",
            "-i",
            "redis",
            "-x",
            "-g",
            "-w",
            "3",
        ])
        .unwrap()
        .into_config()
        .unwrap();
        assert_eq!(config.chart_search_root, PathBuf::from("charts"));
        assert_eq!(config.value_files, ["values.yml", "values.yaml"]);
        assert!(config.synthesis.skip.title);
        assert!(config.synthesis.skip.default);
        assert_eq!(config.dependencies_filter, ["redis"]);
        assert!(!config.synthesis.strip_helm_docs_prefix);
        assert!(!config.synthesis.add_global);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_unknown_skip_field() {
        let err = Args::try_parse_from(["chart-schema", "-k", "titel"])
            .unwrap()
            .into_config()
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
