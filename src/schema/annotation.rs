//! Annotation parser
//!
//! Extracts `# @schema` blocks and the free-text description from the comment
//! written above a values key, plus the document-level `# @schema.root` block
//! and helm-docs style `# --` comments.

use super::model::{Schema, SchemaType};
use crate::error::SchemaError;
use regex::Regex;
use std::sync::LazyLock;

/// Line that opens and closes a key annotation block
pub const SCHEMA_MARKER: &str = "# @schema";

/// Line that opens and closes the document root annotation block
pub const ROOT_SCHEMA_MARKER: &str = "# @schema.root";

#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)(\r\n|\r|\n)?\s*@\w+(\s+--\s)?[^\n\r]*").expect("valid regex")
});
#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^--\s?").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s+--\s*(.*)$").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s+@default\s+--\s*(.*)$").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s+@\w+").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static HELM_DOCS_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((.*?)\)\s*(.*)$").expect("valid regex"));

/// Schema fragment and description read from a key comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub schema: Schema,
    pub description: String,
}

/// Remove the comment marker and at most one following space
fn decomment(line: &str) -> &str {
    let line = line.strip_prefix('#').unwrap_or(line);
    line.strip_prefix(' ').unwrap_or(line)
}

/// Parse the comment attached to `key`
///
/// Lines between a pair of `# @schema` markers are read as a YAML schema
/// fragment; every other line becomes part of the description.
///
/// # Errors
///
/// Returns `MalformedAnnotation` if a block is left open or its content is
/// not a valid schema fragment
pub fn parse_annotation(comment: &str, key: &str) -> Result<Annotation, SchemaError> {
    let mut inside = false;
    let mut found = false;
    let mut raw = Vec::new();
    let mut description = Vec::new();

    for line in comment.lines() {
        if line.trim_end() == SCHEMA_MARKER {
            inside = !inside;
            found = true;
            continue;
        }
        if inside {
            raw.push(decomment(line));
        } else {
            description.push(decomment(line));
        }
    }
    if inside {
        return Err(SchemaError::malformed(key, "unclosed schema block"));
    }

    let mut schema =
        Schema::from_yaml_str(&raw.join("\n"))
            .map_err(|e| SchemaError::malformed(key, e.to_string()))?;
    schema.has_data = found;

    Ok(Annotation {
        schema,
        description: description.join("\n"),
    })
}

/// Split the `# @schema.root` block off a document comment
///
/// Returns the root fragment (if a block was present) and the comment with
/// the block removed.
///
/// # Errors
///
/// Returns `MalformedAnnotation` if the block is left open or its content is
/// not a valid schema fragment
pub fn split_root_annotation(comment: &str) -> Result<(Option<Schema>, String), SchemaError> {
    let mut inside = false;
    let mut found = false;
    let mut raw = Vec::new();
    let mut remaining = Vec::new();

    for line in comment.lines() {
        if line.trim_end() == ROOT_SCHEMA_MARKER {
            inside = !inside;
            found = true;
            continue;
        }
        if inside {
            raw.push(decomment(line));
        } else {
            remaining.push(line);
        }
    }
    if inside {
        return Err(SchemaError::malformed("<root>", "unclosed root schema block"));
    }
    if !found {
        return Ok((None, comment.to_owned()));
    }

    let mut schema = Schema::from_yaml_str(&raw.join("\n"))
        .map_err(|e| SchemaError::malformed("<root>", e.to_string()))?;
    schema.set();
    Ok((Some(schema), remaining.join("\n")))
}

/// Drop everything but the last comment paragraph (the one touching the key)
#[must_use]
#[inline]
pub fn last_paragraph(comment: &str) -> &str {
    comment
        .rfind("\n\n")
        .map_or(comment, |pos| comment[pos..].trim_start_matches('\n'))
}

/// Remove helm-docs `@tag` lines and `-- ` prefixes from a description
#[must_use]
pub fn strip_helm_docs(description: &str) -> String {
    let without_tags = HELM_DOCS_TAGS.replace_all(description, "");
    HELM_DOCS_PREFIX.replace_all(&without_tags, "").into_owned()
}

/// Values read from a helm-docs style comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelmDocsComment {
    pub value_type: Option<String>,
    pub description: Option<String>,
    pub default: Option<String>,
}

fn captured<'t>(regex: &Regex, text: &'t str, group: usize) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(group))
        .map(|m| m.as_str())
}

/// Parse the last `# --` group of a comment
#[must_use]
pub fn parse_helm_docs(comment: &str) -> HelmDocsComment {
    let lines: Vec<&str> = comment.lines().collect();
    let Some(start) = lines
        .iter()
        .rposition(|line| captured(&HELM_DOCS_START, line, 1).is_some())
    else {
        return HelmDocsComment::default();
    };

    let mut parsed = HelmDocsComment::default();
    let first = captured(&HELM_DOCS_START, lines[start], 1).unwrap_or_default();
    let mut description = match (
        captured(&HELM_DOCS_TYPE, first, 1),
        captured(&HELM_DOCS_TYPE, first, 2),
    ) {
        (Some(value_type), Some(rest)) => {
            parsed.value_type = Some(value_type.trim().to_owned());
            rest.to_owned()
        }
        _ => first.to_owned(),
    };

    for line in &lines[start + 1..] {
        if let Some(default) = captured(&HELM_DOCS_DEFAULT, line, 1) {
            parsed.default = Some(default.trim().to_owned());
            continue;
        }
        if line.trim_end() == SCHEMA_MARKER
            || captured(&HELM_DOCS_TAG_LINE, line, 0).is_some()
            || !line.trim_start().starts_with('#')
        {
            continue;
        }
        let text = decomment(line.trim_start()).trim();
        if !text.is_empty() {
            if !description.is_empty() {
                description.push(' ');
            }
            description.push_str(text);
        }
    }

    let description = description.trim();
    if !description.is_empty() {
        parsed.description = Some(description.to_owned());
    }
    parsed
}

/// Map a helm-docs type name to a schema type
///
/// # Errors
///
/// Returns an error message naming the type if it has no schema counterpart
pub fn helm_docs_type(name: &str) -> Result<SchemaType, String> {
    match name {
        "int" | "integer" => Ok(SchemaType::Integer),
        "bool" | "boolean" => Ok(SchemaType::Boolean),
        "float" | "number" => Ok(SchemaType::Number),
        "list" | "array" => Ok(SchemaType::Array),
        "map" | "dict" | "object" => Ok(SchemaType::Object),
        "string" => Ok(SchemaType::String),
        other => Err(format!("unsupported helm-docs type '{other}'")),
    }
}
