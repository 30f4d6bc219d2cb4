//! Schema synthesizer
//!
//! Walks a values document and produces its schema: explicit `@schema`
//! annotations are merged with types, titles, descriptions and defaults
//! inferred from the values themselves.

use super::annotation::{
    Annotation, helm_docs_type, last_paragraph, parse_annotation, parse_helm_docs,
    split_root_annotation, strip_helm_docs,
};
use super::model::{AdditionalProperties, DRAFT_07, OneOrMany, Schema, SchemaType, SchemaTypes};
use super::reference::{hoist_definitions, resolve_references};
use super::validation::{ValidationError, validate};
use crate::config::SynthesisOptions;
use crate::error::SchemaError;
use crate::system::System;
use crate::values::{MappingEntry, Scalar, ScalarKind, ValuesDocument, ValuesNode};
use regex::Regex;
use serde_json::{Number, Value};
use std::path::Path;
use tracing::warn;

/// Name of the cross-chart values key injected at the document root
pub const GLOBAL_KEY: &str = "global";

const GLOBAL_DESCRIPTION: &str =
    "Global values are values that can be accessed from any chart or subchart by exactly the same name.";

/// Intrinsic schema type of a values node
#[must_use]
pub const fn infer_type(node: &ValuesNode) -> SchemaType {
    match node {
        ValuesNode::Mapping(_) => SchemaType::Object,
        ValuesNode::Sequence(_) => SchemaType::Array,
        ValuesNode::Scalar(scalar) => match scalar.kind {
            ScalarKind::Null => SchemaType::Null,
            ScalarKind::Bool => SchemaType::Boolean,
            ScalarKind::Int => SchemaType::Integer,
            ScalarKind::Float => SchemaType::Number,
            ScalarKind::Timestamp | ScalarKind::String => SchemaType::String,
        },
    }
}

/// Convert a scalar into a `default` value of the first matching type
#[must_use]
pub fn cast_default(scalar: &Scalar, types: Option<&SchemaTypes>) -> Value {
    if scalar.kind == ScalarKind::Null {
        return Value::Null;
    }
    let raw = scalar.raw.as_str();
    for schema_type in types.into_iter().flat_map(OneOrMany::iter) {
        let cast = match schema_type {
            SchemaType::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            SchemaType::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<u64>().map(Value::from))
                .ok(),
            SchemaType::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            _ => None,
        };
        if let Some(value) = cast {
            return value;
        }
    }
    Value::String(raw.to_owned())
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

/// Produces the schema of one values file
pub struct Synthesizer<'a> {
    options: &'a SynthesisOptions,
    system: &'a dyn System,
    values_path: &'a Path,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer for the values file at `values_path`
    ///
    /// `$ref` paths are resolved relative to the directory of `values_path`.
    #[must_use]
    #[inline]
    pub fn new(
        options: &'a SynthesisOptions,
        system: &'a dyn System,
        values_path: &'a Path,
    ) -> Self {
        Self {
            options,
            system,
            values_path,
        }
    }

    /// Synthesize the schema of a whole document
    ///
    /// # Errors
    ///
    /// Returns the first annotation, validation or reference error met; the
    /// document is not partially synthesized
    pub fn synthesize(&self, document: &ValuesDocument) -> Result<Schema, SchemaError> {
        let skip = self.options.skip;

        let (root_annotation, first_comment) = match document.entries.first() {
            Some(first) => {
                let (root, remaining) = split_root_annotation(&first.head_comment)?;
                (root, Some(remaining))
            }
            None => (None, None),
        };

        let body = self.synthesize_entries(&document.entries, "", first_comment.as_deref())?;
        let mut schema = Schema::with_type(SchemaType::Object);
        schema.dialect = Some(DRAFT_07.to_owned());
        schema.properties = body.properties;
        schema.required = body.required;

        if self.options.add_global && !schema.properties.contains_key(GLOBAL_KEY) {
            let mut global = Schema::with_type(SchemaType::Object);
            if !skip.title {
                global.title = Some(GLOBAL_KEY.to_owned());
            }
            if !skip.description {
                global.description = Some(GLOBAL_DESCRIPTION.to_owned());
            }
            schema.properties.insert(GLOBAL_KEY.to_owned(), global);
        }

        if !skip.additional_properties {
            schema.additional_properties = Some(AdditionalProperties::Bool(false));
        }

        if let Some(root) = root_annotation {
            validate(&root).map_err(|source| SchemaError::Validation {
                key: "<root>".to_owned(),
                source,
            })?;
            apply_root_annotation(&mut schema, root);
        }

        hoist_definitions(&mut schema)?;
        Ok(schema)
    }

    /// Build an `object` fragment whose properties are the given entries
    fn synthesize_entries<'e, I>(
        &self,
        entries: I,
        parent: &str,
        first_comment: Option<&str>,
    ) -> Result<Schema, SchemaError>
    where
        I: IntoIterator<Item = &'e MappingEntry>,
    {
        let mut schema = Schema::with_type(SchemaType::Object);
        for (position, entry) in entries.into_iter().enumerate() {
            let comment = match first_comment {
                Some(comment) if position == 0 => comment,
                _ => entry.head_comment.as_str(),
            };
            let (child, required) = self.synthesize_entry(entry, comment, parent)?;
            if required {
                schema.add_required(&entry.key);
            }
            schema.properties.insert(entry.key.clone(), child);
        }
        Ok(schema)
    }

    /// Synthesize one key, returning its fragment and whether the parent
    /// must list it as required
    fn synthesize_entry(
        &self,
        entry: &MappingEntry,
        comment: &str,
        parent: &str,
    ) -> Result<(Schema, bool), SchemaError> {
        let options = self.options;
        let skip = options.skip;
        let key_path = child_path(parent, &entry.key);

        let comment = if options.keep_full_comment {
            comment
        } else {
            last_paragraph(comment)
        };
        let Annotation {
            mut schema,
            mut description,
        } = parse_annotation(comment, &key_path)?;

        if options.helm_docs_compatibility {
            self.apply_helm_docs(&mut schema, &entry.head_comment, &key_path);
        }
        if options.strip_helm_docs_prefix {
            description = strip_helm_docs(&description);
        }
        let description = description.trim();

        if schema.reference.is_some() || !schema.pattern_properties.is_empty() {
            resolve_references(&mut schema, self.values_path, self.system)?;
        }

        if schema.has_data {
            validate(&schema).map_err(|source| SchemaError::Validation {
                key: key_path.clone(),
                source,
            })?;
        } else if !skip.schema_type {
            schema.schema_type = Some(OneOrMany::One(infer_type(&entry.value)));
        }

        let required_flag = schema.take_required_flag();
        if schema.reference.is_some() {
            return Ok((schema, false));
        }

        let required = required_flag
            || (schema.required_names().is_empty() && !skip.required && !schema.has_data);

        let is_mapping = matches!(entry.value, ValuesNode::Mapping(_));
        if !skip.additional_properties
            && is_mapping
            && (!schema.has_data || schema.additional_properties.is_none())
        {
            schema.additional_properties = Some(AdditionalProperties::Bool(false));
        }
        if schema.title.is_none() && !skip.title {
            schema.title = Some(entry.key.clone());
        }
        if schema.description.is_none() && !skip.description && !description.is_empty() {
            schema.description = Some(description.to_owned());
        }
        if !skip.default
            && schema.default.is_none()
            && let ValuesNode::Scalar(scalar) = &entry.value
        {
            schema.default = Some(cast_default(scalar, schema.schema_type.as_ref()));
        }

        match &entry.value {
            ValuesNode::Mapping(children) if schema.properties.is_empty() => {
                let patterns = compile_patterns(&schema, &key_path)?;
                let kept = children
                    .iter()
                    .filter(|child| !patterns.iter().any(|re| re.is_match(&child.key)));
                let generated = self.synthesize_entries(kept, &key_path, None)?;
                for name in generated.required_names() {
                    schema.add_required(name);
                }
                schema.properties = generated.properties;
            }
            ValuesNode::Sequence(items) if schema.items.is_none() => {
                schema.items = Some(Box::new(self.synthesize_items(items, &key_path)?));
                schema.fix_required();
            }
            _ => {}
        }

        if schema.has_data {
            schema.fix_required();
        }

        Ok((schema, required))
    }

    /// Build the item schema of a sequence: one `anyOf` member per element
    fn synthesize_items(&self, items: &[ValuesNode], path: &str) -> Result<Schema, SchemaError> {
        let mut schema = Schema::new();
        for (position, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{position}]");
            let member = match item {
                ValuesNode::Scalar(_) => Schema::with_type(infer_type(item)),
                ValuesNode::Mapping(entries) => {
                    let mut member = self.synthesize_entries(entries, &item_path, None)?;
                    if !self.options.skip.additional_properties {
                        member.additional_properties = Some(AdditionalProperties::Bool(false));
                    }
                    member
                }
                ValuesNode::Sequence(nested) => {
                    let mut member = Schema::with_type(SchemaType::Array);
                    member.items = Some(Box::new(self.synthesize_items(nested, &item_path)?));
                    member
                }
            };
            schema.any_of.push(member);
        }
        Ok(schema)
    }

    /// Backfill `default`, `description` and `type` from a helm-docs comment
    fn apply_helm_docs(&self, schema: &mut Schema, comment: &str, key_path: &str) {
        let helm_docs = parse_helm_docs(comment);
        if let Some(default) = helm_docs.default
            && schema.default.is_none()
        {
            schema.set();
            schema.default = Some(Value::String(default));
        }
        if let Some(description) = helm_docs.description
            && schema.description.is_none()
        {
            schema.set();
            schema.description = Some(description);
        }
        if let Some(value_type) = helm_docs.value_type
            && schema.type_is_unset()
        {
            match helm_docs_type(&value_type) {
                Ok(schema_type) => {
                    schema.set();
                    schema.schema_type = Some(OneOrMany::One(schema_type));
                }
                Err(message) => warn!("{} ({key_path}): {message}", self.values_path.display()),
            }
        }
    }
}

fn compile_patterns(schema: &Schema, key_path: &str) -> Result<Vec<Regex>, SchemaError> {
    schema
        .pattern_properties
        .keys()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| SchemaError::Validation {
                key: key_path.to_owned(),
                source: ValidationError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                },
            })
        })
        .collect()
}

/// Copy the root-level keywords of a `@schema.root` block onto the document
fn apply_root_annotation(schema: &mut Schema, root: Schema) {
    if root.title.is_some() {
        schema.title = root.title;
    }
    if root.description.is_some() {
        schema.description = root.description;
    }
    if root.reference.is_some() {
        schema.reference = root.reference;
    }
    if root.examples.is_some() {
        schema.examples = root.examples;
    }
    if root.deprecated.is_some() {
        schema.deprecated = root.deprecated;
    }
    if root.read_only.is_some() {
        schema.read_only = root.read_only;
    }
    if root.write_only.is_some() {
        schema.write_only = root.write_only;
    }
    if root.additional_properties.is_some() {
        schema.additional_properties = root.additional_properties;
    }
    schema.custom_annotations.extend(root.custom_annotations);
}
