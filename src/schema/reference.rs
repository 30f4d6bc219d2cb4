//! Reference resolver and definition hoisting
//!
//! `$ref` values that point at files next to the values file are inlined, so
//! the generated schema is self-contained. Anything else (internal pointers,
//! URLs, absolute paths) is left for the consuming validator.

use super::model::Schema;
use crate::error::SchemaError;
use crate::system::System;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFS_POINTER: &str = "/$defs/";
const DEFINITIONS_POINTER: &str = "/definitions/";

/// Resolve the `$ref` of `schema` and of its `patternProperties` values
///
/// References that are not relative file paths are kept as they are.
///
/// # Errors
///
/// Returns `UnresolvedReference` if a referenced file is missing, cannot be
/// parsed, or does not contain the requested JSON pointer
pub fn resolve_references(
    schema: &mut Schema,
    values_path: &Path,
    system: &dyn System,
) -> Result<(), SchemaError> {
    if let Some(reference) = schema.reference.clone() {
        match load_reference(&reference, values_path, system) {
            Ok(loaded) => *schema = loaded,
            Err(SchemaError::NotARelativePath { reference }) => {
                debug!("Keeping reference '{reference}' as is");
            }
            Err(err) => return Err(err),
        }
    }

    for child in schema.pattern_properties.values_mut() {
        if child.reference.is_some() {
            resolve_references(child, values_path, system)?;
        }
    }
    Ok(())
}

/// Split a reference into its file part and optional JSON pointer
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((file, pointer)) => (file, Some(pointer)),
        None => (reference, None),
    }
}

/// Path of a referenced file relative to the directory of `values_path`
///
/// # Errors
///
/// Returns `NotARelativePath` for internal pointers, URLs and absolute paths
pub fn relative_target(reference: &str, values_path: &Path) -> Result<PathBuf, SchemaError> {
    let (file, _) = split_reference(reference);
    let not_relative = || SchemaError::NotARelativePath {
        reference: reference.to_owned(),
    };
    if file.is_empty() || file.contains("://") || Path::new(file).is_absolute() {
        return Err(not_relative());
    }
    let base = values_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(base.join(file))
}

fn load_reference(
    reference: &str,
    values_path: &Path,
    system: &dyn System,
) -> Result<Schema, SchemaError> {
    let target = relative_target(reference, values_path)?;
    let (_, pointer) = split_reference(reference);

    let is_file = system
        .is_file(&target)
        .map_err(|e| SchemaError::unresolved(reference, e.to_string()))?;
    if !is_file {
        return Err(SchemaError::unresolved(
            reference,
            format!("file not found: {}", target.display()),
        ));
    }
    let content = system
        .read_to_string(&target)
        .map_err(|e| SchemaError::unresolved(reference, e.to_string()))?;
    let document = parse_document(&target, &content)
        .map_err(|message| SchemaError::unresolved(reference, message))?;

    let mut loaded = match pointer.filter(|p| !p.is_empty()) {
        Some(pointer) => {
            let fragment = lookup(&document, pointer).ok_or_else(|| {
                SchemaError::unresolved(reference, format!("JSON pointer '{pointer}' not found"))
            })?;
            let mut fragment = Schema::from_json_value(fragment.clone())
                .map_err(|e| SchemaError::unresolved(reference, e.to_string()))?;
            carry_definitions(&document, &mut fragment)
                .map_err(|message| SchemaError::unresolved(reference, message))?;
            fragment
        }
        None => Schema::from_json_value(document)
            .map_err(|e| SchemaError::unresolved(reference, e.to_string()))?,
    };
    loaded.set();
    Ok(loaded)
}

fn parse_document(path: &Path, content: &str) -> Result<Value, String> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }
}

/// Follow a JSON pointer, accepting `definitions` and `$defs` interchangeably
fn lookup<'v>(document: &'v Value, pointer: &str) -> Option<&'v Value> {
    document.pointer(pointer).or_else(|| {
        let alternative = if let Some(rest) = pointer.strip_prefix(DEFS_POINTER) {
            format!("{DEFINITIONS_POINTER}{rest}")
        } else if let Some(rest) = pointer.strip_prefix(DEFINITIONS_POINTER) {
            format!("{DEFS_POINTER}{rest}")
        } else {
            return None;
        };
        document.pointer(&alternative)
    })
}

/// Copy the referenced document's top-level definitions into a projected
/// fragment so internal `#/$defs/...` references keep working once hoisted
fn carry_definitions(document: &Value, fragment: &mut Schema) -> Result<(), String> {
    for (keyword, target) in [
        ("$defs", &mut fragment.defs),
        ("definitions", &mut fragment.definitions),
    ] {
        let Some(Value::Object(entries)) = document.get(keyword) else {
            continue;
        };
        for (name, value) in entries {
            if target.contains_key(name) {
                continue;
            }
            let definition = Schema::from_json_value(value.clone())
                .map_err(|e| format!("invalid definition '{name}': {e}"))?;
            target.insert(name.clone(), definition);
        }
    }
    Ok(())
}

/// Move every `$defs`/`definitions` entry below the root up to the root
///
/// Each keyword keeps its own map. Identical entries under the same name are
/// merged; differing ones are a conflict.
///
/// # Errors
///
/// Returns `DefinitionConflict` if two different definitions share a name
pub fn hoist_definitions(root: &mut Schema) -> Result<(), SchemaError> {
    let mut defs = IndexMap::new();
    let mut definitions = IndexMap::new();

    for child in root.nested_mut(true) {
        collect_definitions(child, &mut defs, &mut definitions)?;
    }
    for definition in root.defs.values_mut().chain(root.definitions.values_mut()) {
        collect_definitions(definition, &mut defs, &mut definitions)?;
    }

    for (name, definition) in defs {
        insert_definition(&mut root.defs, name, definition)?;
    }
    for (name, definition) in definitions {
        insert_definition(&mut root.definitions, name, definition)?;
    }
    Ok(())
}

/// Copy the root definitions of `source` into the root of `target`
///
/// # Errors
///
/// Returns `DefinitionConflict` if both hold a different definition under
/// the same name
pub fn merge_definitions(target: &mut Schema, source: &Schema) -> Result<(), SchemaError> {
    for (name, definition) in &source.defs {
        insert_definition(&mut target.defs, name.clone(), definition.clone())?;
    }
    for (name, definition) in &source.definitions {
        insert_definition(&mut target.definitions, name.clone(), definition.clone())?;
    }
    Ok(())
}

fn collect_definitions(
    schema: &mut Schema,
    defs: &mut IndexMap<String, Schema>,
    definitions: &mut IndexMap<String, Schema>,
) -> Result<(), SchemaError> {
    for (name, mut definition) in std::mem::take(&mut schema.defs) {
        collect_definitions(&mut definition, defs, definitions)?;
        insert_definition(defs, name, definition)?;
    }
    for (name, mut definition) in std::mem::take(&mut schema.definitions) {
        collect_definitions(&mut definition, defs, definitions)?;
        insert_definition(definitions, name, definition)?;
    }
    for child in schema.nested_mut(true) {
        collect_definitions(child, defs, definitions)?;
    }
    Ok(())
}

fn insert_definition(
    target: &mut IndexMap<String, Schema>,
    name: String,
    definition: Schema,
) -> Result<(), SchemaError> {
    match target.get(&name) {
        Some(existing) if existing.to_value().ok() != definition.to_value().ok() => {
            Err(SchemaError::DefinitionConflict { name })
        }
        Some(_) => Ok(()),
        None => {
            target.insert(name, definition);
            Ok(())
        }
    }
}
