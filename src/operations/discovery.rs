//! Discovery of `Chart.yaml` files below the search root

use crate::config::{CHART_FILE_NAME, ChartFile, GenerateConfig};
use crate::error::SchemaError;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Find every chart descriptor below `config.chart_search_root`
///
/// A descriptor directly in the search root is always returned. Other charts
/// are returned only when the dependency filter is empty or selects their
/// name; a descriptor that cannot be read for that check is logged and
/// skipped. Paths are returned sorted.
///
/// # Errors
///
/// Returns an error if the search root does not exist or is not a directory
pub fn discover_charts(system: &dyn System, config: &GenerateConfig) -> Result<Vec<PathBuf>> {
    let root = &config.chart_search_root;
    if !system.is_dir(root).unwrap_or(false) {
        return Err(SchemaError::filesystem(format!(
            "Chart search root is not a directory: {}",
            root.display()
        ))
        .into());
    }
    let root = system
        .canonicalize(root)
        .with_context(|| format!("Failed to canonicalize search root: {}", root.display()))?;

    let entries = system
        .walk_dir(&root, false)
        .with_context(|| format!("Failed to walk directory: {}", root.display()))?;

    let mut charts = Vec::new();
    for entry in entries {
        if !entry.is_file || entry.path.file_name() != Some(OsStr::new(CHART_FILE_NAME)) {
            continue;
        }
        if entry.path.parent() == Some(root.as_path()) || config.dependencies_filter.is_empty() {
            charts.push(entry.path);
            continue;
        }
        match ChartFile::load(system, &entry.path) {
            Ok(chart) if config.dependency_selected(&chart.name) => charts.push(entry.path),
            Ok(chart) => debug!(
                "Skipping chart '{}' not selected by the dependency filter",
                chart.name
            ),
            Err(e) => error!("{e:#}"),
        }
    }
    charts.sort();
    debug!("Found {} chart(s) below {}", charts.len(), root.display());
    Ok(charts)
}

/// Find the first existing values file of a chart
///
/// # Errors
///
/// Returns an error if none of the candidate names exists in `chart_dir`
pub fn find_values_file(
    system: &dyn System,
    chart_dir: &Path,
    candidates: &[String],
) -> Result<PathBuf> {
    for name in candidates.iter().filter(|name| !name.trim().is_empty()) {
        let path = chart_dir.join(name.trim());
        if system.is_file(&path).unwrap_or(false) {
            return Ok(path);
        }
    }
    Err(SchemaError::filesystem(format!(
        "no values file found in {} (tried: {})",
        chart_dir.display(),
        candidates.join(", ")
    ))
    .into())
}
