//! Schema fragment validation
//!
//! Rejects annotated fragments that are syntactically valid JSON Schema but
//! semantically inconsistent (e.g. `pattern` on an integer).

use super::model::{AdditionalProperties, Schema, SchemaType};
use thiserror::Error;

/// Formats accepted in the `format` keyword
pub const SUPPORTED_FORMATS: &[&str] = &[
    "date-time",
    "time",
    "date",
    "duration",
    "email",
    "idn-email",
    "hostname",
    "idn-hostname",
    "ipv4",
    "ipv6",
    "uuid",
    "uri",
    "uri-reference",
    "iri",
    "iri-reference",
    "uri-template",
    "json-pointer",
    "relative-json-pointer",
    "regex",
];

/// A violated schema invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("invalid schema syntax: {message}")]
    MetaSchema { message: String },

    #[error("cannot use both 'const' and 'type' in the same schema")]
    ConstWithType,

    #[error("cannot use both 'enum' and 'type' in the same schema")]
    EnumWithType,

    #[error("cannot use both format and pattern in the same schema")]
    PatternWithFormat,

    #[error("{keyword} can only be used with {expected} type, got {actual}")]
    IncompatibleType {
        keyword: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cannot use both {inclusive} and {exclusive}")]
    ExclusiveBoundConflict {
        inclusive: &'static str,
        exclusive: &'static str,
    },

    #[error("{min_keyword} ({min}) cannot be greater than {max_keyword} ({max})")]
    BoundOrder {
        min_keyword: &'static str,
        max_keyword: &'static str,
        min: u64,
        max: u64,
    },

    #[error("invalid {location} schema: {source}")]
    Nested {
        location: String,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Validate a fragment and every fragment nested inside it
///
/// Checks run in a fixed order and the first failure is returned; the
/// fragment is never modified.
///
/// # Errors
///
/// Returns the first violated invariant
pub fn validate(schema: &Schema) -> Result<(), ValidationError> {
    check_syntax(schema)?;
    check_exclusions(schema)?;
    check_type_compatibility(schema)?;
    check_bound_order(schema)?;
    check_nested(schema)
}

fn check_syntax(schema: &Schema) -> Result<(), ValidationError> {
    let value = schema.to_value().map_err(|e| ValidationError::MetaSchema {
        message: e.to_string(),
    })?;
    jsonschema::draft7::meta::validate(&value).map_err(|e| ValidationError::MetaSchema {
        message: e.to_string(),
    })
}

fn check_exclusions(schema: &Schema) -> Result<(), ValidationError> {
    if schema.constant.is_some() && !schema.type_is_unset() {
        return Err(ValidationError::ConstWithType);
    }
    if schema.enumeration.is_some() && !schema.type_is_unset() {
        return Err(ValidationError::EnumWithType);
    }
    if schema.pattern.is_some() && schema.format.is_some() {
        return Err(ValidationError::PatternWithFormat);
    }
    Ok(())
}

/// `type` is unset or includes one of `allowed`
fn type_allows(schema: &Schema, allowed: &[SchemaType]) -> bool {
    schema.type_is_unset() || allowed.iter().any(|t| schema.type_matches(*t))
}

fn incompatible(schema: &Schema, keyword: &'static str, expected: &'static str) -> ValidationError {
    ValidationError::IncompatibleType {
        keyword,
        expected,
        actual: schema
            .schema_type
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

fn check_type_compatibility(schema: &Schema) -> Result<(), ValidationError> {
    let numeric = [
        ("minimum", schema.minimum.is_some()),
        ("maximum", schema.maximum.is_some()),
        ("exclusiveMinimum", schema.exclusive_minimum.is_some()),
        ("exclusiveMaximum", schema.exclusive_maximum.is_some()),
        ("multipleOf", schema.multiple_of.is_some()),
    ];
    if let Some((keyword, _)) = numeric.iter().find(|(_, set)| *set)
        && !type_allows(schema, &[SchemaType::Number, SchemaType::Integer])
    {
        return Err(incompatible(schema, keyword, "number or integer"));
    }
    if schema.minimum.is_some() && schema.exclusive_minimum.is_some() {
        return Err(ValidationError::ExclusiveBoundConflict {
            inclusive: "minimum",
            exclusive: "exclusiveMinimum",
        });
    }
    if schema.maximum.is_some() && schema.exclusive_maximum.is_some() {
        return Err(ValidationError::ExclusiveBoundConflict {
            inclusive: "maximum",
            exclusive: "exclusiveMaximum",
        });
    }

    let string = [
        ("format", schema.format.is_some()),
        ("pattern", schema.pattern.is_some()),
        ("minLength", schema.min_length.is_some()),
        ("maxLength", schema.max_length.is_some()),
    ];
    if let Some((keyword, _)) = string.iter().find(|(_, set)| *set)
        && !type_allows(schema, &[SchemaType::String])
    {
        return Err(incompatible(schema, keyword, "string"));
    }
    if let Some(format) = schema.format.as_deref()
        && !SUPPORTED_FORMATS.contains(&format)
    {
        return Err(ValidationError::UnsupportedFormat {
            format: format.to_owned(),
        });
    }

    let array = [
        ("items", schema.items.is_some()),
        ("minItems", schema.min_items.is_some()),
        ("maxItems", schema.max_items.is_some()),
        ("uniqueItems", schema.unique_items.is_some()),
    ];
    if let Some((keyword, _)) = array.iter().find(|(_, set)| *set)
        && !type_allows(schema, &[SchemaType::Array])
    {
        return Err(incompatible(schema, keyword, "array"));
    }

    let object = [
        ("minProperties", schema.min_properties.is_some()),
        ("maxProperties", schema.max_properties.is_some()),
    ];
    if let Some((keyword, _)) = object.iter().find(|(_, set)| *set)
        && !type_allows(schema, &[SchemaType::Object])
    {
        return Err(incompatible(schema, keyword, "object"));
    }
    Ok(())
}

fn check_bound_order(schema: &Schema) -> Result<(), ValidationError> {
    let pairs = [
        ("minLength", schema.min_length, "maxLength", schema.max_length),
        ("minItems", schema.min_items, "maxItems", schema.max_items),
        (
            "minProperties",
            schema.min_properties,
            "maxProperties",
            schema.max_properties,
        ),
    ];
    for (min_keyword, min, max_keyword, max) in pairs {
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(ValidationError::BoundOrder {
                min_keyword,
                max_keyword,
                min,
                max,
            });
        }
    }
    Ok(())
}

fn check_nested(schema: &Schema) -> Result<(), ValidationError> {
    let nest = |location: String, child: &Schema| {
        validate(child).map_err(|e| ValidationError::Nested {
            location,
            source: Box::new(e),
        })
    };

    if let Some(items) = schema.items.as_deref() {
        nest("items".to_owned(), items)?;
    }
    for (keyword, members) in [
        ("allOf", &schema.all_of),
        ("anyOf", &schema.any_of),
        ("oneOf", &schema.one_of),
    ] {
        for (index, member) in members.iter().enumerate() {
            nest(format!("{keyword}[{index}]"), member)?;
        }
    }
    for (keyword, branch) in [
        ("if", &schema.if_schema),
        ("then", &schema.then_schema),
        ("else", &schema.else_schema),
        ("not", &schema.not),
    ] {
        if let Some(branch) = branch.as_deref() {
            nest(keyword.to_owned(), branch)?;
        }
    }
    for (pattern, child) in &schema.pattern_properties {
        nest(format!("patternProperties '{pattern}'"), child)?;
    }
    for (name, child) in &schema.properties {
        nest(format!("property '{name}'"), child)?;
    }
    if let Some(AdditionalProperties::Schema(child)) = schema.additional_properties.as_ref() {
        nest("additionalProperties".to_owned(), child)?;
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Schema {
        Schema::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_const_with_type_fails() {
        let err = validate(&parse("type: string\nconst: foo")).unwrap_err();
        assert_eq!(err, ValidationError::ConstWithType);
    }

    #[test]
    fn test_enum_with_type_fails() {
        let err = validate(&parse("type: string\nenum: [a, b]")).unwrap_err();
        assert_eq!(err, ValidationError::EnumWithType);
    }

    #[test]
    fn test_enum_without_type_passes() {
        validate(&parse("enum: [a, b]")).unwrap();
    }

    #[test]
    fn test_pattern_and_format_are_exclusive() {
        let err = validate(&parse("pattern: ^foo\nformat: ipv4")).unwrap_err();
        assert_eq!(err, ValidationError::PatternWithFormat);
    }

    #[test]
    fn test_pattern_requires_string_type() {
        let err = validate(&parse("type: integer\npattern: ^foo")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::IncompatibleType {
                keyword: "pattern",
                ..
            }
        ));
        validate(&parse("type: [string, null]\npattern: ^foo")).unwrap();
    }

    #[test]
    fn test_unsupported_format_fails() {
        let err = validate(&parse("type: string\nformat: colour")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedFormat {
                format: "colour".to_owned()
            }
        );
    }

    #[test]
    fn test_multiple_of_must_be_positive() {
        for yaml in ["multipleOf: 0", "multipleOf: -1", "type: number\nmultipleOf: -0.5"] {
            let err = validate(&parse(yaml)).unwrap_err();
            assert!(matches!(err, ValidationError::MetaSchema { .. }), "{yaml}: {err}");
        }
        validate(&parse("type: number\nmultipleOf: 0.1")).unwrap();
    }

    #[test]
    fn test_minimum_and_exclusive_minimum_conflict() {
        let err = validate(&parse("minimum: 1\nexclusiveMinimum: 0")).unwrap_err();
        assert!(matches!(err, ValidationError::ExclusiveBoundConflict { .. }));
    }

    #[test]
    fn test_maximum_and_exclusive_maximum_conflict() {
        let err = validate(&parse("type: number\nmaximum: 5\nexclusiveMaximum: 6")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ExclusiveBoundConflict {
                inclusive: "maximum",
                exclusive: "exclusiveMaximum",
            }
        );
        validate(&parse("type: number\nminimum: 1\nexclusiveMaximum: 6")).unwrap();
    }

    #[test]
    fn test_minimum_requires_numeric_type() {
        let err = validate(&parse("type: string\nminimum: 1")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompatibleType {
                keyword: "minimum",
                expected: "number or integer",
                actual: "[string]".to_owned(),
            }
        );
        validate(&parse("type: integer\nminimum: 1")).unwrap();
    }

    #[test]
    fn test_item_bounds() {
        let err = validate(&parse("type: array\nminItems: 3\nmaxItems: 2")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::BoundOrder {
                min_keyword: "minItems",
                max_keyword: "maxItems",
                min: 3,
                max: 2,
            }
        );
        validate(&parse("type: array\nminItems: 2\nmaxItems: 2")).unwrap();
        validate(&parse("type: array\nminItems: 1\nmaxItems: 2")).unwrap();
    }

    #[test]
    fn test_property_bounds() {
        let err = validate(&parse("type: object\nminProperties: 2\nmaxProperties: 1")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::BoundOrder {
                min_keyword: "minProperties",
                ..
            }
        ));
        validate(&parse("type: object\nminProperties: 1\nmaxProperties: 1")).unwrap();
    }

    #[test]
    fn test_array_keywords_require_array_type() {
        for (yaml, keyword) in [
            ("type: string\nminItems: 1", "minItems"),
            ("type: object\nuniqueItems: true", "uniqueItems"),
        ] {
            let err = validate(&parse(yaml)).unwrap_err();
            assert!(
                matches!(
                    err,
                    ValidationError::IncompatibleType { keyword: k, expected: "array", .. }
                        if k == keyword
                ),
                "{yaml}: {err}"
            );
        }
        validate(&parse("type: array\nuniqueItems: true")).unwrap();
    }

    #[test]
    fn test_object_keywords_require_object_type() {
        for (yaml, keyword) in [
            ("type: array\nminProperties: 1", "minProperties"),
            ("type: string\nmaxProperties: 3", "maxProperties"),
        ] {
            let err = validate(&parse(yaml)).unwrap_err();
            assert!(
                matches!(
                    err,
                    ValidationError::IncompatibleType { keyword: k, expected: "object", .. }
                        if k == keyword
                ),
                "{yaml}: {err}"
            );
        }
        validate(&parse("minProperties: 1")).unwrap();
    }

    #[test]
    fn test_length_bounds() {
        let err = validate(&parse("minLength: 2\nmaxLength: 1")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "minLength (2) cannot be greater than maxLength (1)"
        );
        validate(&parse("minLength: 1\nmaxLength: 2")).unwrap();
    }

    #[test]
    fn test_items_require_array_type() {
        let err = validate(&parse("type: object\nitems:\n  type: string")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::IncompatibleType { keyword: "items", .. }
        ));
    }

    #[test]
    fn test_nested_failure_reports_location() {
        let err = validate(&parse("anyOf:\n  - type: string\n  - type: integer\n    pattern: x"))
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid anyOf[1] schema"));
    }

    #[test]
    fn test_meta_schema_rejects_bad_keyword_values() {
        let err = validate(&parse("required: [a, a]")).unwrap_err();
        assert!(matches!(err, ValidationError::MetaSchema { .. }));
    }
}
