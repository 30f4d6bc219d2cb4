//! File content utilities

use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Replace Windows line endings with `\n`
#[must_use]
#[inline]
pub fn normalize_newlines(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Read a text file through the system abstraction with normalized newlines
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn read_normalized(system: &dyn System, path: &Path) -> Result<String> {
    let content = system
        .read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(normalize_newlines(&content))
}

/// Insert `line` at the start of the first YAML document of `content`
///
/// A leading `---` document marker stays first. The original line ending
/// style is preserved.
#[must_use]
pub fn prefix_first_document(line: &str, content: &str) -> String {
    let eol = if content.ends_with("\r\n") { "\r\n" } else { "\n" };
    let document_start = format!("---{eol}");
    match content.strip_prefix(&document_start) {
        Some(rest) => format!("{document_start}{line}{eol}{rest}"),
        None => format!("{line}{eol}{content}"),
    }
}

/// Add a `yaml-language-server` schema reference to a values file unless it
/// already has one
///
/// Returns `true` if the file was changed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written
pub fn add_schema_reference(
    system: &dyn System,
    values_path: &Path,
    schema_file: &str,
) -> Result<bool> {
    let reference = format!("# yaml-language-server: $schema={schema_file}");
    let content = system
        .read_to_string(values_path)
        .with_context(|| format!("Failed to read file: {}", values_path.display()))?;
    if content.contains(&reference) {
        return Ok(false);
    }
    let updated = prefix_first_document(&reference, &content);
    system
        .write(values_path, updated.as_bytes())
        .with_context(|| format!("Failed to write file: {}", values_path.display()))?;
    Ok(true)
}
