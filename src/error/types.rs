//! Custom error types with exit codes

use crate::schema::validation::ValidationError;
use thiserror::Error;

/// Main error type for chart-schema operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SchemaError {
    /// Configuration Error - missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Annotation Error - unterminated block or invalid embedded YAML
    #[error("Malformed annotation on key '{key}': {message}")]
    MalformedAnnotation { key: String, message: String },

    /// Validation Error - an annotated schema violates a schema invariant
    #[error("Invalid schema for key '{key}': {source}")]
    Validation {
        key: String,
        #[source]
        source: ValidationError,
    },

    /// Reference Error - `$ref` target missing, unreadable or bad pointer
    #[error("Unresolved reference '{reference}': {message}")]
    UnresolvedReference { reference: String, message: String },

    /// Reference is not a file relative to the values file
    #[error("Reference '{reference}' is not a relative file path")]
    NotARelativePath { reference: String },

    /// Two hoisted definitions share a name but differ
    #[error("Conflicting definitions for '{name}' while hoisting to the schema root")]
    DefinitionConflict { name: String },

    /// The same package (name and version) was found twice
    #[error("Duplicate chart found: {name} - consider changing the name or version")]
    DuplicatePackage { name: String },

    /// Dependency graph contains a cycle
    #[error("Circular dependency found at chart '{name}'")]
    CircularDependency { name: String },

    /// Values document contains a node kind that cannot be mapped to a schema type
    #[error("Unsupported value at '{path}': {kind}")]
    UnsupportedValueKind { path: String, kind: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },

    /// One or more charts could not be processed
    #[error("Errors were found in {count} chart(s)")]
    ChartsFailed { count: usize },
}

impl SchemaError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::MalformedAnnotation { .. }
            | Self::Validation { .. }
            | Self::UnsupportedValueKind { .. } => 2,
            Self::UnresolvedReference { .. }
            | Self::NotARelativePath { .. }
            | Self::DefinitionConflict { .. } => 3,
            Self::DuplicatePackage { .. } | Self::CircularDependency { .. } => 4,
            Self::Filesystem { .. } => 5,
            Self::ChartsFailed { .. } => 6,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a malformed annotation error
    #[inline]
    pub fn malformed<K: Into<String>, S: Into<String>>(key: K, message: S) -> Self {
        Self::MalformedAnnotation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved reference error
    #[inline]
    pub fn unresolved<R: Into<String>, S: Into<String>>(reference: R, message: S) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported value kind error
    #[inline]
    pub fn unsupported<P: Into<String>, S: Into<String>>(path: P, kind: S) -> Self {
        Self::UnsupportedValueKind {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message() {
        let err = SchemaError::CircularDependency {
            name: "A".to_owned(),
        };
        assert_eq!(err.to_string(), "Circular dependency found at chart 'A'");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_validation_error_keeps_source() {
        let err = SchemaError::Validation {
            key: "service.port".to_owned(),
            source: ValidationError::PatternWithFormat,
        };
        assert!(err.to_string().contains("service.port"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "cannot use both format and pattern in the same schema"
        );
    }
}
