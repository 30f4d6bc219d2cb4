//! # `chart-schema`
//!
//! `chart-schema` generates JSON Schema files for Helm charts. Types, titles,
//! descriptions and defaults are inferred from each chart's values file and
//! refined with `# @schema` comment blocks; dependency schemas are folded into
//! their parents.
//!
//! ## Usage
//!
//! ```sh
//! chart-schema --chart-search-root ./charts
//! chart-schema --dry-run --helm-docs-compatibility-mode
//! ```
//!
//! See `chart-schema --help` for every option.

use anyhow::Result;
use chart_schema::cli::Args;
use chart_schema::error::SchemaError;
use chart_schema::system::real::RealSystem;
use clap::Parser as _;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(err.exit_code());
        }
    };

    let system = RealSystem::new();
    match chart_schema::run(&config, &system) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(
                err.downcast_ref::<SchemaError>()
                    .map_or(1, SchemaError::exit_code),
            );
        }
    }
}
