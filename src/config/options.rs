//! Synthesis options

use crate::error::SchemaError;
use std::str::FromStr;

/// Keywords that are not filled in automatically
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "One switch per keyword")]
pub struct SkipAutoGeneration {
    pub schema_type: bool,
    pub title: bool,
    pub description: bool,
    pub required: bool,
    pub default: bool,
    pub additional_properties: bool,
}

impl SkipAutoGeneration {
    /// Field names accepted by [`Self::from_fields`]
    pub const FIELDS: [&'static str; 6] = [
        "type",
        "title",
        "description",
        "required",
        "default",
        "additionalProperties",
    ];

    /// Build from a list of keyword names
    ///
    /// # Errors
    ///
    /// Returns a configuration error listing every unknown name
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, SchemaError> {
        let mut skip = Self::default();
        let mut invalid = Vec::new();
        for field in fields {
            match field.as_ref().trim() {
                "type" => skip.schema_type = true,
                "title" => skip.title = true,
                "description" => skip.description = true,
                "required" => skip.required = true,
                "default" => skip.default = true,
                "additionalProperties" => skip.additional_properties = true,
                "" => {}
                other => invalid.push(other.to_owned()),
            }
        }
        if !invalid.is_empty() {
            return Err(SchemaError::configuration(format!(
                "unsupported field names '{}' for skipping auto-generation (supported: {})",
                invalid.join("', '"),
                Self::FIELDS.join(", ")
            )));
        }
        Ok(skip)
    }
}

impl FromStr for SkipAutoGeneration {
    type Err = SchemaError;

    /// Parse a comma separated list of keyword names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').collect();
        Self::from_fields(&fields)
    }
}

/// Toggles that control schema synthesis for one values file
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "Mirrors independent CLI switches")]
pub struct SynthesisOptions {
    /// Keep every comment paragraph instead of only the one touching the key
    pub keep_full_comment: bool,
    /// Read helm-docs `# --` comments
    pub helm_docs_compatibility: bool,
    /// Remove helm-docs `-- ` prefixes and `@tag` lines from descriptions
    pub strip_helm_docs_prefix: bool,
    /// Inject the `global` property at the document root
    pub add_global: bool,
    pub skip: SkipAutoGeneration,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            keep_full_comment: false,
            helm_docs_compatibility: false,
            strip_helm_docs_prefix: true,
            add_global: true,
            skip: SkipAutoGeneration::default(),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    #[test]
    fn test_known_fields() {
        let skip: SkipAutoGeneration = "type,additionalProperties".parse().unwrap();
        assert!(skip.schema_type);
        assert!(skip.additional_properties);
        assert!(!skip.title);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = SkipAutoGeneration::from_fields(&["title", "foo", "bar"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: unsupported field names 'foo', 'bar' for skipping auto-generation \
             (supported: type, title, description, required, default, additionalProperties)"
        );
        assert_eq!(err.exit_code(), 1);
    }
}
