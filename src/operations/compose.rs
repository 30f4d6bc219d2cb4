//! Schema composition across chart dependencies
//!
//! Folds each dependency's schema into its parent: library charts are
//! flattened into the parent's properties, other charts are nested under
//! their values key with every `required` list cleared.

use crate::config::{ChartFile, Dependency, GenerateConfig};
use crate::error::SchemaError;
use crate::operations::toposort::dependency_matches;
use crate::operations::worker::ChartResult;
use crate::schema::reference::{hoist_definitions, merge_definitions};
use crate::schema::synthesize::GLOBAL_KEY;
use crate::schema::{AdditionalProperties, Schema, SchemaType};
use tracing::{debug, warn};

/// Description of boolean properties created for dependency conditions
pub const CONDITION_DESCRIPTION: &str = "Conditional property used in parent chart";

/// Compose every successful result, in order
///
/// `results` must already be sorted dependencies first. A composition error
/// is recorded on the result it happened in, which is then no longer
/// available to its dependents.
pub fn compose_all(results: &mut [ChartResult], config: &GenerateConfig) {
    let mut composed: Vec<(ChartFile, Schema)> = Vec::new();
    for result in results.iter_mut() {
        if !result.is_ok() {
            continue;
        }
        let Some(chart) = result.chart.clone() else {
            continue;
        };
        match compose_chart(&mut result.schema, &chart, &composed, config) {
            Ok(()) => composed.push((chart, result.schema.clone())),
            Err(e) => result.errors.push(e.into()),
        }
    }
}

/// Fold the schemas of `chart`'s dependencies into `schema`
///
/// `available` holds the already composed charts; the last one matching a
/// dependency is used.
///
/// # Errors
///
/// Returns `DefinitionConflict` if a dependency brings a definition that
/// differs from one of the parent's
pub fn compose_chart(
    schema: &mut Schema,
    chart: &ChartFile,
    available: &[(ChartFile, Schema)],
    config: &GenerateConfig,
) -> Result<(), SchemaError> {
    for dependency in &chart.dependencies {
        if dependency.name.is_empty() {
            warn!("Dependency without name found in chart {chart}");
            continue;
        }
        if !config.dependency_selected(&dependency.name) {
            continue;
        }

        let found = available
            .iter()
            .rev()
            .find(|(candidate, _)| dependency_matches(dependency, candidate));
        let Some((dependency_chart, dependency_schema)) = found else {
            warn!(
                "Dependency ({chart}->{}) specified but no schema found. If you want to create \
                 schemas for external dependencies, run `helm dependency build` and untar the charts.",
                dependency.name
            );
            continue;
        };
        debug!("Composing dependency {dependency_chart} into {chart}");

        if dependency_chart.is_library() {
            merge_library(schema, chart, dependency_chart, dependency_schema);
        } else {
            nest_dependency(schema, dependency, dependency_chart, dependency_schema, config);
        }
        merge_definitions(schema, dependency_schema)?;

        for path in dependency.condition_paths() {
            patch_condition(schema, path);
        }
    }
    hoist_definitions(schema)
}

/// Copy a library chart's top-level properties into the parent
fn merge_library(
    schema: &mut Schema,
    chart: &ChartFile,
    library: &ChartFile,
    library_schema: &Schema,
) {
    for (name, property) in &library_schema.properties {
        if name == GLOBAL_KEY {
            continue;
        }
        if schema.properties.contains_key(name) {
            warn!(
                "Property '{name}' of library chart {library} is already defined in {chart}, \
                 keeping the chart's own"
            );
            continue;
        }
        schema.properties.insert(name.clone(), property.clone());
    }
}

/// Nest a dependency's schema under its values key
fn nest_dependency(
    schema: &mut Schema,
    dependency: &Dependency,
    dependency_chart: &ChartFile,
    dependency_schema: &Schema,
    config: &GenerateConfig,
) {
    let key = dependency.values_key();
    let mut nested = Schema::with_type(SchemaType::Object);
    nested.title = Some(dependency.name.clone());
    nested.description = dependency_chart.description.clone();
    nested.properties = dependency_schema.properties.clone();
    nested.disable_required();

    if config.skip_dependencies_schema_validation {
        nested.additional_properties = Some(AdditionalProperties::Bool(true));
        schema.remove_required(key);
    }
    schema.properties.insert(key.to_owned(), nested);
}

/// Make sure the dot-separated `path` exists, ending in a boolean property
///
/// Existing properties along the path are left as they are.
pub fn patch_condition(schema: &mut Schema, path: &str) {
    let keys: Vec<&str> = path.split('.').filter(|key| !key.is_empty()).collect();
    let mut current = schema;
    for (position, key) in keys.iter().enumerate() {
        let leaf = position + 1 == keys.len();
        current = current
            .properties
            .entry((*key).to_owned())
            .or_insert_with(|| {
                debug!("Patching conditional property '{key}' of '{path}'");
                let mut created = if leaf {
                    let mut boolean = Schema::with_type(SchemaType::Boolean);
                    boolean.description = Some(CONDITION_DESCRIPTION.to_owned());
                    boolean
                } else {
                    Schema::with_type(SchemaType::Object)
                };
                created.title = Some((*key).to_owned());
                created
            });
    }
}
