//! Chart descriptor (`Chart.yaml`) loading

use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File name of a chart descriptor
pub const CHART_FILE_NAME: &str = "Chart.yaml";

/// Chart type; library charts are flattened into their parent's schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Library,
    #[default]
    #[serde(other)]
    Application,
}

/// A dependency declared in `Chart.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Dependency {
    /// Key under which this dependency's values live in the parent
    #[must_use]
    #[inline]
    pub fn values_key(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.name)
    }

    /// Enablement condition paths (`a.enabled,global.a.enabled` lists several)
    pub fn condition_paths(&self) -> impl Iterator<Item = &str> {
        self.condition
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// The fields of `Chart.yaml` needed for schema generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub chart_type: ChartType,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ChartFile {
    /// Parse `Chart.yaml` content
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid chart descriptor
    pub fn parse(content: &str) -> Result<Self> {
        let chart: Self =
            serde_yaml::from_str(content).context("Failed to parse chart descriptor")?;
        Ok(chart)
    }

    /// Load a chart descriptor through the system abstraction
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(system: &dyn System, path: &Path) -> Result<Self> {
        let content = system
            .read_to_string(path)
            .with_context(|| format!("Failed to read chart file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid chart file: {}", path.display()))
    }

    /// True for library charts
    #[must_use]
    #[inline]
    pub fn is_library(&self) -> bool {
        self.chart_type == ChartType::Library
    }
}

impl fmt::Display for ChartFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version.as_deref() {
            Some(version) => write!(f, "{}@{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_file() {
        let chart = ChartFile::parse(
            "apiVersion: v2\nname: app\nversion: 1.2.3\ndescription: My app\ntype: application\ndependencies:\n  - name: redis\n    version: ^17.0.0\n    alias: cache\n    condition: cache.enabled,global.cache.enabled\n  - name: common\n",
        )
        .unwrap();
        assert_eq!(chart.name, "app");
        assert_eq!(chart.to_string(), "app@1.2.3");
        assert!(!chart.is_library());
        assert_eq!(chart.dependencies.len(), 2);
        assert_eq!(chart.dependencies[0].values_key(), "cache");
        assert_eq!(
            chart.dependencies[0].condition_paths().collect::<Vec<_>>(),
            ["cache.enabled", "global.cache.enabled"]
        );
        assert_eq!(chart.dependencies[1].values_key(), "common");
        assert_eq!(chart.dependencies[1].condition_paths().count(), 0);
    }

    #[test]
    fn test_library_type() {
        let chart = ChartFile::parse("name: common\ntype: library\n").unwrap();
        assert!(chart.is_library());
        let chart = ChartFile::parse("name: odd\ntype: something\n").unwrap();
        assert_eq!(chart.chart_type, ChartType::Application);
    }

    #[test]
    fn test_missing_name_fails() {
        assert!(ChartFile::parse("version: 1.0.0\n").is_err());
    }
}
