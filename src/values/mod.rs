//! Configuration document tree
//!
//! A values file parsed into an ordered tree whose mapping keys carry the
//! comment text written above them.

pub mod comments;
pub mod uncomment;

use crate::error::SchemaError;
use comments::{CommentIndex, KeyInfo, PathSegment, display_path};
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

#[expect(clippy::expect_used, reason = "Constant pattern")]
static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}-\d{1,2}-\d{1,2}(?:(?:[Tt]|[ \t]+)\d{1,2}:\d{2}:\d{2}(?:\.\d*)?(?:[ \t]*(?:Z|[-+]\d{1,2}(?::\d{2})?))?)?$",
    )
    .expect("valid regex")
});

/// Intrinsic kind of a scalar value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    Int,
    Float,
    Timestamp,
    String,
}

/// A leaf value with its textual form
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub raw: String,
}

/// A node of the values tree
#[derive(Debug, Clone, PartialEq)]
pub enum ValuesNode {
    Mapping(Vec<MappingEntry>),
    Sequence(Vec<ValuesNode>),
    Scalar(Scalar),
}

/// A key of a mapping together with its head comment and value
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub key: String,
    pub head_comment: String,
    /// Zero-based line and column of the key; `None` for keys merged in
    /// through `<<`
    pub position: Option<(usize, usize)>,
    pub value: ValuesNode,
}

/// A parsed values document; the root is always a mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuesDocument {
    pub entries: Vec<MappingEntry>,
}

impl ValuesDocument {
    /// Parse values file content
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The content is not valid YAML
    /// - The document root is not a mapping
    /// - A value uses a node kind that has no schema type (e.g. a custom tag)
    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let has_content = source.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#') && line != "---"
        });
        if !has_content {
            return Ok(Self::default());
        }

        let mut value: Value = serde_yaml::from_str(source)
            .map_err(|e| SchemaError::unsupported("<root>", format!("invalid YAML: {e}")))?;
        value
            .apply_merge()
            .map_err(|e| SchemaError::unsupported("<root>", format!("invalid merge key: {e}")))?;

        let index = comments::scan(source);
        let mut path = Vec::new();
        match &value {
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => match build(&value, &mut path, &index)? {
                ValuesNode::Mapping(entries) => Ok(Self { entries }),
                _ => Err(SchemaError::unsupported("<root>", "document is not a mapping")),
            },
            other => Err(SchemaError::unsupported(
                "<root>",
                format!("document root must be a mapping, found {}", kind_name(other)),
            )),
        }
    }

    /// True if the document holds no keys
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn key_text(key: &Value, path: &[PathSegment]) -> Result<String, SchemaError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_owned()),
        other => Err(SchemaError::unsupported(
            display_path(path),
            format!("{} used as a mapping key", kind_name(other)),
        )),
    }
}

fn build(
    value: &Value,
    path: &mut Vec<PathSegment>,
    index: &CommentIndex,
) -> Result<ValuesNode, SchemaError> {
    let node = match value {
        Value::Null => scalar(ScalarKind::Null, "null"),
        Value::Bool(b) => scalar(ScalarKind::Bool, &b.to_string()),
        Value::Number(n) => {
            let kind = if n.is_f64() {
                ScalarKind::Float
            } else {
                ScalarKind::Int
            };
            scalar(kind, &n.to_string())
        }
        Value::String(s) => {
            let is_timestamp = TIMESTAMP.is_match(s);
            let kind = if is_timestamp {
                ScalarKind::Timestamp
            } else {
                ScalarKind::String
            };
            scalar(kind, s)
        }
        Value::Sequence(items) => {
            let mut nodes = Vec::with_capacity(items.len());
            for (position, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(position));
                nodes.push(build(item, path, index)?);
                path.pop();
            }
            ValuesNode::Sequence(nodes)
        }
        Value::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, child) in mapping {
                let key = key_text(key, path)?;
                path.push(PathSegment::Key(key.clone()));
                let info = index.get(path.as_slice()).cloned();
                let value = build(child, path, index)?;
                path.pop();
                let position = info.as_ref().map(|i| (i.line, i.column));
                let KeyInfo { comment, .. } = info.unwrap_or_default();
                entries.push(MappingEntry {
                    key,
                    head_comment: comment,
                    position,
                    value,
                });
            }
            ValuesNode::Mapping(entries)
        }
        Value::Tagged(tagged) => {
            return Err(SchemaError::unsupported(
                display_path(path),
                format!("custom tag {}", tagged.tag),
            ));
        }
    };
    Ok(node)
}

fn scalar(kind: ScalarKind, raw: &str) -> ValuesNode {
    ValuesNode::Scalar(Scalar {
        kind,
        raw: raw.to_owned(),
    })
}
