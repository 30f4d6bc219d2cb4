//! Dependency ordering of synthesized charts

use crate::config::{ChartFile, Dependency};
use crate::error::SchemaError;
use crate::operations::worker::ChartResult;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use semver::{Version, VersionReq};
use std::collections::HashSet;
use tracing::{debug, warn};

/// True if `chart` satisfies the name and version constraint of `dependency`
///
/// A missing or unparseable constraint or chart version matches by name only.
#[must_use]
pub fn dependency_matches(dependency: &Dependency, chart: &ChartFile) -> bool {
    if dependency.name != chart.name {
        return false;
    }
    let Some(constraint) = dependency.version.as_deref().filter(|v| !v.trim().is_empty()) else {
        return true;
    };
    let Some(version) = chart.version.as_deref() else {
        return true;
    };
    match (VersionReq::parse(constraint), Version::parse(version)) {
        (Ok(requirement), Ok(version)) => requirement.matches(&version),
        _ => {
            debug!(
                "Cannot compare version '{version}' of chart '{}' against '{constraint}', \
                 matching by name",
                chart.name
            );
            true
        }
    }
}

/// Order results so that every chart comes after the charts it depends on
///
/// Results without a descriptor are dropped. Only dependencies accepted by
/// `selected` are followed.
///
/// # Errors
///
/// Returns an error if:
/// - Two charts share the same name and version (`DuplicatePackage`)
/// - The graph has a cycle and `allow_cycles` is false (`CircularDependency`)
pub fn topo_sort<F>(
    results: Vec<ChartResult>,
    allow_cycles: bool,
    selected: F,
) -> Result<Vec<ChartResult>, SchemaError>
where
    F: Fn(&str) -> bool,
{
    let results: Vec<ChartResult> = results.into_iter().filter(|r| r.chart.is_some()).collect();
    let charts: Vec<&ChartFile> = results.iter().filter_map(|r| r.chart.as_ref()).collect();

    let mut identities = HashSet::new();
    for chart in &charts {
        let identity = (chart.name.as_str(), chart.version.as_deref().unwrap_or_default());
        if !identities.insert(identity) {
            return Err(SchemaError::DuplicatePackage {
                name: chart.name.clone(),
            });
        }
    }

    // Nodes carry the index into `results`; edges point from a chart to its dependencies
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(charts.len(), 0);
    let nodes: Vec<NodeIndex> = (0..charts.len()).map(|index| graph.add_node(index)).collect();
    for (from, chart) in charts.iter().enumerate() {
        for dependency in chart.dependencies.iter().filter(|d| selected(&d.name)) {
            for (to, candidate) in charts.iter().enumerate() {
                if dependency_matches(dependency, candidate) {
                    graph.add_edge(nodes[from], nodes[to], ());
                }
            }
        }
    }

    let sorted = match toposort(&graph, None) {
        Ok(sorted) => sorted,
        Err(cycle) => {
            let name = charts[graph[cycle.node_id()]].name.clone();
            if !allow_cycles {
                return Err(SchemaError::CircularDependency { name });
            }
            warn!("Circular dependency found at chart '{name}', keeping the unsorted order");
            return Ok(results);
        }
    };
    debug!("Sorted {} chart(s) by dependency", sorted.len());

    let mut slots: Vec<Option<ChartResult>> = results.into_iter().map(Some).collect();
    // Dependents come first in `sorted`; reverse so dependencies lead
    Ok(sorted
        .into_iter()
        .rev()
        .filter_map(|node| slots[graph[node]].take())
        .collect())
}
