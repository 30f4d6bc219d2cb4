//! Schema generation run
//!
//! Discovers charts, synthesizes them on the worker pool, orders and composes
//! the successful ones, then writes (or prints) one schema per chart.

use crate::config::GenerateConfig;
use crate::error::SchemaError;
use crate::operations::compose::compose_all;
use crate::operations::discovery::discover_charts;
use crate::operations::toposort::topo_sort;
use crate::operations::worker::{ChartResult, run_pool};
use crate::system::System;
use anyhow::{Context as _, Result};
use tracing::{debug, error, info};

/// Coordinates a complete generation run
#[non_exhaustive]
pub struct GenerateOperation<'src> {
    config: &'src GenerateConfig,
    system: &'src dyn System,
}

impl<'src> GenerateOperation<'src> {
    /// Create a generation run over `config.chart_search_root`
    #[must_use]
    #[inline]
    pub const fn new(config: &'src GenerateConfig, system: &'src dyn System) -> Self {
        Self { config, system }
    }

    /// Execute the run
    ///
    /// Charts that fail are reported and skipped; every other chart is still
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The search root cannot be walked
    /// - Dependency ordering fails (duplicate chart or disallowed cycle)
    /// - Any chart failed (`ChartsFailed`)
    pub fn execute(&self) -> Result<()> {
        let config = self.config;
        let charts = discover_charts(self.system, config)?;
        let results = run_pool(self.system, config, &charts)?;

        let (mut succeeded, failed): (Vec<ChartResult>, Vec<ChartResult>) =
            results.into_iter().partition(ChartResult::is_ok);
        let mut failures = failed.len();
        for result in &failed {
            report_errors(result);
        }

        if !config.no_dependencies {
            succeeded = topo_sort(succeeded, config.allow_circular_dependencies, |name| {
                config.dependency_selected(name)
            })?;
            compose_all(&mut succeeded, config);
        }

        for result in &succeeded {
            if !result.errors.is_empty() {
                report_errors(result);
                failures += 1;
                continue;
            }
            if let Err(e) = self.emit(result) {
                error!("{e:#}");
                failures += 1;
            }
        }

        if failures > 0 {
            return Err(SchemaError::ChartsFailed { count: failures }.into());
        }
        info!("Generated schemas for {} chart(s)", succeeded.len());
        Ok(())
    }

    /// Write the schema next to the chart, or print it in dry-run mode
    fn emit(&self, result: &ChartResult) -> Result<()> {
        let json = result
            .schema
            .to_json()
            .with_context(|| {
                format!("Failed to serialize schema of chart {}", result.display_name())
            })?;

        if self.config.dry_run {
            info!(
                "Printing schema for chart {} ({})",
                result.display_name(),
                result.chart_path.display()
            );
            println!("{json}");
            return Ok(());
        }

        let output = result.chart_dir().join(&self.config.output_file);
        self.system
            .write(&output, format!("{json}\n").as_bytes())
            .map_err(|e| {
                SchemaError::filesystem(format!("Failed to write {}: {e}", output.display()))
            })?;
        debug!("Wrote {}", output.display());
        Ok(())
    }
}

fn report_errors(result: &ChartResult) {
    error!(
        "Found {} error(s) while processing the chart {} ({})",
        result.errors.len(),
        result.display_name(),
        result.chart_path.display()
    );
    for e in &result.errors {
        error!("{e:#}");
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;
    use std::path::{Path, PathBuf};

    fn config() -> GenerateConfig {
        GenerateConfig {
            chart_search_root: PathBuf::from("/repo"),
            workers: 2,
            ..GenerateConfig::default()
        }
    }

    #[test]
    fn test_failed_chart_does_not_stop_others() {
        let system = MockSystem::new()
            .with_file("/repo/good/Chart.yaml", b"name: good\n")
            .unwrap()
            .with_file("/repo/good/values.yaml", b"a: 1\n")
            .unwrap()
            .with_file("/repo/bad/Chart.yaml", b"name: bad\n")
            .unwrap()
            .with_file("/repo/bad/values.yaml", b"# @schema\n# type: string\na: 1\n")
            .unwrap();
        let config = config();
        let err = GenerateOperation::new(&config, &system).execute().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::ChartsFailed { count: 1 })
        ));
        assert!(system.is_file(Path::new("/repo/good/values.schema.json")).unwrap());
        assert!(!system.is_file(Path::new("/repo/bad/values.schema.json")).unwrap());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let system = MockSystem::new()
            .with_file("/repo/Chart.yaml", b"name: app\n")
            .unwrap()
            .with_file("/repo/values.yaml", b"a: 1\n")
            .unwrap();
        let config = GenerateConfig {
            dry_run: true,
            ..config()
        };
        GenerateOperation::new(&config, &system).execute().unwrap();
        assert!(!system.exists(Path::new("/repo/values.schema.json")).unwrap());
    }
}
