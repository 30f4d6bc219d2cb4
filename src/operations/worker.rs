//! Per-chart synthesis and the worker pool that runs it

use crate::config::{ChartFile, GenerateConfig};
use crate::operations::discovery::find_values_file;
use crate::schema::{Schema, Synthesizer};
use crate::system::System;
use crate::utils::fs::{add_schema_reference, read_normalized};
use crate::values::ValuesDocument;
use crate::values::uncomment::uncomment;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info};

/// Outcome of synthesizing one chart
#[derive(Debug)]
pub struct ChartResult {
    /// Path of the chart's `Chart.yaml`
    pub chart_path: PathBuf,
    pub values_path: Option<PathBuf>,
    /// Parsed descriptor; `None` if `Chart.yaml` could not be loaded
    pub chart: Option<ChartFile>,
    pub schema: Schema,
    pub errors: Vec<anyhow::Error>,
}

impl ChartResult {
    fn new(chart_path: &Path) -> Self {
        Self {
            chart_path: chart_path.to_path_buf(),
            values_path: None,
            chart: None,
            schema: Schema::new(),
            errors: Vec::new(),
        }
    }

    /// True if the chart was synthesized without errors
    #[must_use]
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.chart.is_some()
    }

    /// Directory containing the chart
    #[must_use]
    pub fn chart_dir(&self) -> &Path {
        self.chart_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Chart name, or the descriptor path when the descriptor is unreadable
    #[must_use]
    pub fn display_name(&self) -> String {
        self.chart.as_ref().map_or_else(
            || self.chart_path.display().to_string(),
            ToString::to_string,
        )
    }
}

/// Load, preprocess and synthesize the chart at `chart_path`
///
/// Never fails as a whole: every error is recorded in the result.
#[must_use]
pub fn process_chart(
    system: &dyn System,
    config: &GenerateConfig,
    chart_path: &Path,
) -> ChartResult {
    let mut result = ChartResult::new(chart_path);

    let chart = match ChartFile::load(system, chart_path) {
        Ok(chart) => chart,
        Err(e) => {
            result.errors.push(e);
            return result;
        }
    };
    debug!("Synthesizing chart {chart} ({})", chart_path.display());
    result.chart = Some(chart);

    let values_path = match find_values_file(system, result.chart_dir(), &config.value_files) {
        Ok(path) => path,
        Err(e) => {
            result.errors.push(e);
            return result;
        }
    };
    result.values_path = Some(values_path.clone());

    match synthesize_values(system, config, &values_path) {
        Ok(schema) => result.schema = schema,
        Err(e) => result.errors.push(e),
    }
    result
}

fn synthesize_values(
    system: &dyn System,
    config: &GenerateConfig,
    values_path: &Path,
) -> Result<Schema> {
    let mut content = read_normalized(system, values_path)?;

    if config.add_schema_reference && !config.dry_run {
        add_schema_reference(system, values_path, &config.output_file)?;
    }
    if config.uncomment {
        content = uncomment(&content);
    }

    let document = ValuesDocument::parse(&content)
        .with_context(|| format!("Failed to parse values file: {}", values_path.display()))?;
    let schema = Synthesizer::new(&config.synthesis, system, values_path)
        .synthesize(&document)
        .with_context(|| format!("Failed to synthesize schema for {}", values_path.display()))?;
    Ok(schema)
}

/// Synthesize every chart on a dedicated worker pool
///
/// Results are returned sorted by chart path.
///
/// # Errors
///
/// Returns an error if the thread pool cannot be created
pub fn run_pool(
    system: &dyn System,
    config: &GenerateConfig,
    charts: &[PathBuf],
) -> Result<Vec<ChartResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|index| format!("chart-schema-worker-{index}"))
        .build()
        .context("Failed to build the worker pool")?;
    info!("Synthesizing {} chart(s) with {} worker(s)", charts.len(), config.workers);

    let (sender, receiver) = mpsc::channel();
    pool.scope(|scope| {
        for chart_path in charts {
            let sender = sender.clone();
            scope.spawn(move |_| {
                if sender.send(process_chart(system, config, chart_path)).is_err() {
                    debug!("Result of {} was not collected", chart_path.display());
                }
            });
        }
    });
    drop(sender);

    let mut results: Vec<ChartResult> = receiver.iter().collect();
    results.sort_by(|a, b| a.chart_path.cmp(&b.chart_path));
    Ok(results)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    fn config() -> GenerateConfig {
        GenerateConfig {
            workers: 2,
            ..GenerateConfig::default()
        }
    }

    #[test]
    fn test_process_chart() {
        let system = MockSystem::new()
            .with_file("/app/Chart.yaml", b"name: app\nversion: 1.0.0\n")
            .unwrap()
            .with_file("/app/values.yaml", b"replicas: 1\r\n")
            .unwrap();
        let result = process_chart(&system, &config(), Path::new("/app/Chart.yaml"));

        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.display_name(), "app@1.0.0");
        assert_eq!(result.values_path, Some(PathBuf::from("/app/values.yaml")));
        assert!(result.schema.properties.contains_key("replicas"));
    }

    #[test]
    fn test_missing_values_file_is_recorded() {
        let system = MockSystem::new()
            .with_file("/app/Chart.yaml", b"name: app\n")
            .unwrap();
        let result = process_chart(&system, &config(), Path::new("/app/Chart.yaml"));

        assert!(!result.is_ok());
        assert!(result.chart.is_some());
        assert!(result.errors[0].to_string().contains("no values file found"));
    }

    #[test]
    fn test_schema_reference_and_uncomment() {
        let system = MockSystem::new()
            .with_file("/app/Chart.yaml", b"name: app\n")
            .unwrap()
            .with_file("/app/values.yaml", b"# enabled: true\nname: x\n")
            .unwrap();
        let config = GenerateConfig {
            add_schema_reference: true,
            uncomment: true,
            ..config()
        };
        let result = process_chart(&system, &config, Path::new("/app/Chart.yaml"));

        assert!(result.is_ok(), "{:?}", result.errors);
        assert!(result.schema.properties.contains_key("enabled"));
        let values = system.read_to_string(Path::new("/app/values.yaml")).unwrap();
        assert!(values.starts_with("# yaml-language-server: $schema=values.schema.json\n"));
    }

    #[test]
    fn test_pool_returns_sorted_results() {
        let system = MockSystem::new()
            .with_file("/b/Chart.yaml", b"name: b\n")
            .unwrap()
            .with_file("/b/values.yaml", b"a: 1\n")
            .unwrap()
            .with_file("/a/Chart.yaml", b"name: a\n")
            .unwrap()
            .with_file("/a/values.yaml", b"a: 1\n")
            .unwrap();
        let charts = vec![PathBuf::from("/b/Chart.yaml"), PathBuf::from("/a/Chart.yaml")];
        let results = run_pool(&system, &config(), &charts).unwrap();

        let names: Vec<String> = results.iter().map(ChartResult::display_name).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
