//! Schema value model
//!
//! Typed representation of a JSON Schema fragment as read from annotation
//! blocks and referenced files, and as written to the generated schema.
//! Polymorphic keywords (`type`, `required`, `additionalProperties`) are
//! explicit enums; vendor `x-` keywords are inlined at serialization time.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use tracing::debug;

/// Dialect identifier attached to every generated document root
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Prefix of vendor extension keywords kept as custom annotations
pub const CUSTOM_ANNOTATION_PREFIX: &str = "x-";

/// JSON Schema primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SchemaType {
    Null,
    Boolean,
    String,
    Integer,
    Number,
    Array,
    Object,
}

impl SchemaType {
    /// Keyword spelling of this type
    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Parse a type keyword, returning `None` for anything unsupported
    #[must_use]
    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyword value that is either a single item or a list of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: PartialEq> OneOrMany<T> {
    /// True if `item` is (one of) the stored values
    #[must_use]
    #[inline]
    pub fn matches(&self, item: &T) -> bool {
        match self {
            Self::One(value) => value == item,
            Self::Many(values) => values.contains(item),
        }
    }

    /// True if no value is stored
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(values) => values.is_empty(),
        }
    }

    /// Iterate over the stored values
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let values: &[T] = match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        values.iter()
    }
}

impl<T: Serialize> Serialize for OneOrMany<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::One(value) => value.serialize(serializer),
            Self::Many(values) if values.len() == 1 => values[0].serialize(serializer),
            Self::Many(values) => values.serialize(serializer),
        }
    }
}

/// Set of types allowed by a fragment
pub type SchemaTypes = OneOrMany<SchemaType>;

impl fmt::Display for SchemaTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|t| t.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// The `required` keyword
///
/// While authoring, `required: true` marks the key itself as required in its
/// parent. Once fixed up, a fragment holds the names of its required children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Required {
    Flag(bool),
    Names(Vec<String>),
}

impl Required {
    /// True if nothing would be emitted for this value
    #[must_use]
    #[inline]
    pub fn is_hidden(required: &Option<Self>) -> bool {
        match required {
            None | Some(Self::Flag(_)) => true,
            Some(Self::Names(names)) => names.is_empty(),
        }
    }
}

impl Serialize for Required {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag(_) => serializer.serialize_seq(Some(0))?.end(),
            Self::Names(names) => names.serialize(serializer),
        }
    }
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// A JSON Schema fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Schema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_types"
    )]
    pub schema_type: Option<SchemaTypes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(rename = "minProperties", skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(rename = "maxProperties", skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(rename = "patternProperties", skip_serializing_if = "IndexMap::is_empty")]
    pub pattern_properties: IndexMap<String, Schema>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(
        skip_serializing_if = "Required::is_hidden",
        deserialize_with = "deserialize_required"
    )]
    pub required: Option<Required>,
    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_schema: Option<Box<Schema>>,
    #[serde(rename = "then", skip_serializing_if = "Option::is_none")]
    pub then_schema: Option<Box<Schema>>,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(rename = "$defs", skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, Schema>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,

    /// Vendor `x-` keywords, inlined into the fragment on output
    #[serde(flatten)]
    pub custom_annotations: IndexMap<String, Value>,

    /// Set once any explicit annotation was read for this fragment
    #[serde(skip)]
    pub has_data: bool,
}

impl Schema {
    /// Create an empty fragment
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fragment with a single type
    #[must_use]
    #[inline]
    pub fn with_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(OneOrMany::One(schema_type)),
            ..Self::default()
        }
    }

    /// Parse an annotation block (YAML) into a fragment
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a YAML mapping of schema keywords
    #[inline]
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut schema: Self = serde_yaml::from_str(text)?;
        schema.retain_custom_annotations();
        Ok(schema)
    }

    /// Convert a JSON value (e.g. a referenced schema file) into a fragment
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object of schema keywords
    #[inline]
    pub fn from_json_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut schema: Self = serde_json::from_value(value)?;
        schema.retain_custom_annotations();
        Ok(schema)
    }

    /// Mark this fragment as carrying explicit data
    #[inline]
    pub fn set(&mut self) {
        self.has_data = true;
    }

    /// True if `type` is unset or empty
    #[must_use]
    #[inline]
    pub fn type_is_unset(&self) -> bool {
        self.schema_type.as_ref().is_none_or(OneOrMany::is_empty)
    }

    /// True if `type` includes `schema_type`
    #[must_use]
    #[inline]
    pub fn type_matches(&self, schema_type: SchemaType) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(|types| types.matches(&schema_type))
    }

    /// Names listed in the array form of `required`
    #[must_use]
    #[inline]
    pub fn required_names(&self) -> &[String] {
        match self.required.as_ref() {
            Some(Required::Names(names)) => names,
            _ => &[],
        }
    }

    /// Add a name to the array form of `required` (no duplicates)
    #[inline]
    pub fn add_required(&mut self, name: &str) {
        match self.required.as_mut() {
            Some(Required::Names(names)) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_owned());
                }
            }
            _ => self.required = Some(Required::Names(vec![name.to_owned()])),
        }
    }

    /// Remove a name from the array form of `required`
    #[inline]
    pub fn remove_required(&mut self, name: &str) {
        if let Some(Required::Names(names)) = self.required.as_mut() {
            names.retain(|n| n != name);
        }
    }

    /// Take the authoring-time `required: <bool>` marker, leaving nothing behind
    ///
    /// A fragment that already holds the array form keeps it and reports `false`.
    #[inline]
    pub fn take_required_flag(&mut self) -> bool {
        match self.required {
            Some(Required::Flag(flag)) => {
                self.required = None;
                flag
            }
            _ => false,
        }
    }

    /// Promote boolean `required` markers of properties into the parent's
    /// array-form `required`, recursively
    ///
    /// A fragment with properties but no type becomes an `object`.
    pub fn fix_required(&mut self) {
        let mut promoted = Vec::new();
        for (name, child) in &mut self.properties {
            let marked = child.take_required_flag();
            child.fix_required();
            if marked {
                promoted.push(name.clone());
            }
        }
        for name in &promoted {
            self.add_required(name);
        }
        if !self.properties.is_empty() && self.type_is_unset() {
            self.schema_type = Some(OneOrMany::One(SchemaType::Object));
        }

        for child in self.nested_mut(false) {
            child.fix_required();
        }
    }

    /// Clear every `required` list in this fragment and all nested fragments
    pub fn disable_required(&mut self) {
        self.required = None;
        for child in self.nested_mut(true) {
            child.disable_required();
        }
    }

    /// Nested fragments that hold instance constraints
    ///
    /// `with_properties` controls whether `properties` values are included;
    /// definitions are never included.
    pub(crate) fn nested_mut(&mut self, with_properties: bool) -> Vec<&mut Self> {
        let mut nested: Vec<&mut Self> = Vec::new();
        if with_properties {
            nested.extend(self.properties.values_mut());
        }
        nested.extend(self.pattern_properties.values_mut());
        nested.extend(self.items.as_deref_mut());
        if let Some(AdditionalProperties::Schema(schema)) = self.additional_properties.as_mut() {
            nested.push(schema);
        }
        nested.extend(self.all_of.iter_mut());
        nested.extend(self.any_of.iter_mut());
        nested.extend(self.one_of.iter_mut());
        nested.extend(self.not.as_deref_mut());
        nested.extend(self.if_schema.as_deref_mut());
        nested.extend(self.then_schema.as_deref_mut());
        nested.extend(self.else_schema.as_deref_mut());
        nested
    }

    /// Serialize to the wire format
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented as JSON
    #[inline]
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented as JSON
    #[inline]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Drop every unknown keyword that is not an `x-` custom annotation
    fn retain_custom_annotations(&mut self) {
        self.custom_annotations.retain(|key, _| {
            let keep = key.starts_with(CUSTOM_ANNOTATION_PREFIX);
            if !keep {
                debug!("Ignoring unknown schema keyword '{key}'");
            }
            keep
        });
        for child in self.nested_mut(true) {
            child.retain_custom_annotations();
        }
        for child in self.defs.values_mut().chain(self.definitions.values_mut()) {
            child.retain_custom_annotations();
        }
    }
}

fn parse_type_value<E: de::Error>(value: &Value) -> Result<SchemaType, E> {
    match value {
        Value::Null => Ok(SchemaType::Null),
        Value::String(name) => SchemaType::parse(name)
            .ok_or_else(|| E::custom(format!("unsupported type '{name}'"))),
        other => Err(E::custom(format!("unsupported type {other}"))),
    }
}

fn deserialize_types<'de, D>(deserializer: D) -> Result<Option<SchemaTypes>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let types = match raw {
        Value::Array(items) => OneOrMany::Many(
            items
                .iter()
                .map(parse_type_value)
                .collect::<Result<Vec<_>, D::Error>>()?,
        ),
        other => OneOrMany::One(parse_type_value(&other)?),
    };
    Ok(Some(types))
}

fn deserialize_required<'de, D>(deserializer: D) -> Result<Option<Required>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(Required::Flag(flag))),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(de::Error::custom(format!(
                    "required must list property names, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|names| Some(Required::Names(names))),
        other => Err(de::Error::custom(format!(
            "required must be a boolean or a list of names, got {other}"
        ))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_type_serializes_as_string() {
        let schema = Schema::with_type(SchemaType::Integer);
        assert_eq!(schema.to_value().unwrap(), json!({"type": "integer"}));
    }

    #[test]
    fn test_type_list_parses_null_entries() {
        let schema = Schema::from_yaml_str("type: [string, null]").unwrap();
        assert_eq!(
            schema.schema_type,
            Some(OneOrMany::Many(vec![SchemaType::String, SchemaType::Null]))
        );
        assert_eq!(
            schema.to_value().unwrap(),
            json!({"type": ["string", "null"]})
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = Schema::from_yaml_str("type: doesntexist");
        assert!(result.unwrap_err().to_string().contains("doesntexist"));
    }

    #[test]
    fn test_required_flag_is_not_emitted() {
        let schema = Schema::from_yaml_str("required: true\ntype: string").unwrap();
        assert_eq!(schema.required, Some(Required::Flag(true)));
        assert_eq!(schema.to_value().unwrap(), json!({"type": "string"}));
    }

    #[test]
    fn test_custom_annotations_are_inlined() {
        let schema =
            Schema::from_yaml_str("type: string\nx-helm-version: \"3.0\"\nunknown: 1").unwrap();
        assert_eq!(
            schema.custom_annotations.get("x-helm-version"),
            Some(&json!("3.0"))
        );
        assert!(!schema.custom_annotations.contains_key("unknown"));
        assert_eq!(
            schema.to_value().unwrap(),
            json!({"type": "string", "x-helm-version": "3.0"})
        );
    }

    #[test]
    fn test_additional_properties_schema_form() {
        let schema =
            Schema::from_yaml_str("additionalProperties:\n  type: string\n").unwrap();
        assert_eq!(
            schema.additional_properties,
            Some(AdditionalProperties::Schema(Box::new(Schema::with_type(
                SchemaType::String
            ))))
        );
    }

    #[test]
    fn test_fix_required_promotes_markers() {
        let mut schema = Schema::from_yaml_str(
            "properties:\n  a:\n    type: string\n    required: true\n  b:\n    type: string\n",
        )
        .unwrap();
        schema.fix_required();
        assert_eq!(schema.required_names(), ["a".to_owned()]);
        assert!(schema.type_matches(SchemaType::Object));
        assert_eq!(schema.properties["a"].required, None);
    }

    #[test]
    fn test_disable_required_clears_nested_lists() {
        let mut schema = Schema::with_type(SchemaType::Object);
        let mut child = Schema::with_type(SchemaType::Object);
        child.add_required("x");
        let mut item = Schema::with_type(SchemaType::Object);
        item.add_required("y");
        child.items = Some(Box::new(item));
        schema.properties.insert("child".to_owned(), child);
        schema.add_required("child");

        schema.disable_required();

        assert!(schema.required_names().is_empty());
        assert!(schema.properties["child"].required_names().is_empty());
        assert!(
            schema.properties["child"]
                .items
                .as_ref()
                .unwrap()
                .required_names()
                .is_empty()
        );
    }
}
