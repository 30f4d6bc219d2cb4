//! Values file annotator
//!
//! Writes a `# @schema` block with the inferred `type` above every key that
//! does not carry one yet, giving authors a starting point for annotations.

use crate::config::GenerateConfig;
use crate::error::SchemaError;
use crate::operations::discovery::{discover_charts, find_values_file};
use crate::schema::SchemaType;
use crate::schema::annotation::SCHEMA_MARKER;
use crate::schema::synthesize::infer_type;
use crate::system::System;
use crate::values::{MappingEntry, ValuesDocument, ValuesNode};
use anyhow::{Context as _, Result};
use std::path::Path;
use tracing::{error, info};

#[derive(Debug)]
struct InsertionPoint {
    line: usize,
    column: usize,
    type_name: &'static str,
}

/// True if the comment holds a `# @schema` line (`# @schema.root` does not count)
#[must_use]
pub fn has_schema_annotation(comment: &str) -> bool {
    comment.lines().any(|line| line.trim() == SCHEMA_MARKER)
}

/// Type name written into an annotation block
#[must_use]
pub const fn annotation_type(node: &ValuesNode) -> &'static str {
    match infer_type(node) {
        SchemaType::Null => "\"null\"",
        other => other.as_str(),
    }
}

fn collect_insertion_points(entries: &[MappingEntry], points: &mut Vec<InsertionPoint>) {
    for entry in entries {
        if let Some((line, column)) = entry.position
            && !has_schema_annotation(&entry.head_comment)
        {
            points.push(InsertionPoint {
                line,
                column,
                type_name: annotation_type(&entry.value),
            });
        }
        if let ValuesNode::Mapping(children) = &entry.value {
            collect_insertion_points(children, points);
        }
    }
}

/// Insert type annotation blocks into values file content
///
/// Blocks go above any comment lines directly preceding a key. Content
/// without unannotated keys is returned unchanged.
///
/// # Errors
///
/// Returns an error if the content cannot be parsed as a values document
pub fn annotate_content(content: &str) -> Result<String, SchemaError> {
    let document = ValuesDocument::parse(content)?;
    let mut points = Vec::new();
    collect_insertion_points(&document.entries, &mut points);
    if points.is_empty() {
        return Ok(content.to_owned());
    }

    let mut lines: Vec<String> = content.split('\n').map(str::to_owned).collect();
    points.sort_by(|a, b| b.line.cmp(&a.line));
    for point in points {
        if point.line >= lines.len() {
            continue;
        }
        let mut insert_at = point.line;
        while insert_at > 0 && lines[insert_at - 1].trim_start().starts_with('#') {
            insert_at -= 1;
        }
        let indent = " ".repeat(point.column);
        let block = [
            format!("{indent}{SCHEMA_MARKER}"),
            format!("{indent}# type: {}", point.type_name),
            format!("{indent}{SCHEMA_MARKER}"),
        ];
        lines.splice(insert_at..insert_at, block);
    }
    Ok(lines.join("\n"))
}

/// Annotate the values file of one chart
///
/// # Errors
///
/// Returns an error if the values file cannot be found, read, parsed or written
pub fn annotate_chart(
    system: &dyn System,
    config: &GenerateConfig,
    chart_path: &Path,
) -> Result<()> {
    let chart_dir = chart_path.parent().unwrap_or_else(|| Path::new("."));
    let values_path = find_values_file(system, chart_dir, &config.value_files)?;
    let content = system
        .read_to_string(&values_path)
        .with_context(|| format!("Failed to read file: {}", values_path.display()))?;
    let annotated = annotate_content(&content)
        .with_context(|| format!("Failed to annotate {}", values_path.display()))?;

    if config.dry_run {
        info!("Annotated values for {}", values_path.display());
        print!("{annotated}");
        return Ok(());
    }
    system
        .write(&values_path, annotated.as_bytes())
        .with_context(|| format!("Failed to write file: {}", values_path.display()))?;
    info!("Annotated {}", values_path.display());
    Ok(())
}

/// Annotate the values files of every discovered chart
///
/// # Errors
///
/// Returns an error if discovery fails, or `ChartsFailed` if any chart could
/// not be annotated
pub fn run_annotate(system: &dyn System, config: &GenerateConfig) -> Result<()> {
    let charts = discover_charts(system, config)?;
    let mut failed = 0;
    for chart_path in &charts {
        if let Err(e) = annotate_chart(system, config, chart_path) {
            error!("Failed to annotate chart {}: {e:#}", chart_path.display());
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(SchemaError::ChartsFailed { count: failed }.into());
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn test_has_schema_annotation() {
        assert!(!has_schema_annotation(""));
        assert!(!has_schema_annotation("# a normal comment"));
        assert!(has_schema_annotation("# @schema\n# type: string\n# @schema"));
        assert!(!has_schema_annotation("# @schema.root\n# title: x\n# @schema.root"));
        assert!(!has_schema_annotation("# @schema.something"));
    }

    #[test]
    fn test_annotate_nested_keys() {
        let content = "# Image settings\nimage:\n  repository: nginx\n  tag: ~\nreplicas: 1\n";
        let expected = "# @schema\n# type: object\n# @schema\n# Image settings\nimage:\n  # @schema\n  # type: string\n  # @schema\n  repository: nginx\n  # @schema\n  # type: \"null\"\n  # @schema\n  tag: ~\n# @schema\n# type: integer\n# @schema\nreplicas: 1\n";
        assert_eq!(annotate_content(content).unwrap(), expected);
    }

    #[test]
    fn test_annotated_keys_are_left_alone() {
        let content = "# @schema\n# type: string\n# @schema\nname: x\n";
        assert_eq!(annotate_content(content).unwrap(), content);
    }

    #[test]
    fn test_sequences_are_not_entered() {
        let content = "list:\n  - a: 1\n";
        let expected = "# @schema\n# type: array\n# @schema\nlist:\n  - a: 1\n";
        assert_eq!(annotate_content(content).unwrap(), expected);
    }

    #[test]
    fn test_annotate_chart_writes_back() {
        let system = MockSystem::new()
            .with_file("/app/Chart.yaml", b"name: app\n")
            .unwrap()
            .with_file("/app/values.yaml", b"enabled: true\n")
            .unwrap();
        annotate_chart(&system, &GenerateConfig::default(), Path::new("/app/Chart.yaml")).unwrap();
        assert_eq!(
            system.read_to_string(Path::new("/app/values.yaml")).unwrap(),
            "# @schema\n# type: boolean\n# @schema\nenabled: true\n"
        );
    }
}
