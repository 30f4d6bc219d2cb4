//! Commented-out values preprocessor
//!
//! Charts often ship optional settings commented out. This pass turns such
//! blocks back into values whenever the de-commented text is still valid YAML,
//! so the generated schema also describes them. `@schema` blocks are kept as
//! they are.

use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

#[expect(clippy::expect_used, reason = "Constant pattern")]
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static COMMENTED_MAPPING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*#\s*)[^:]+:.*$").expect("valid regex"));
#[expect(clippy::expect_used, reason = "Constant pattern")]
static SCHEMA_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s@schema\s*").expect("valid regex"));

fn push_line(target: &mut String, line: &str) {
    target.push_str(line);
    target.push('\n');
}

/// Uncomment commented-out YAML in a values file
#[must_use]
pub fn uncomment(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut buffer = String::new();
    let mut in_code = false;
    let mut in_schema = false;
    let mut code_indent = 0;

    for line in source.lines() {
        if line.is_empty() && in_code {
            result.push_str(&buffer);
            result.push('\n');
            buffer.clear();
            in_code = false;
            continue;
        }

        if SCHEMA_MARKER.is_match(line) {
            in_schema = !in_schema;
            push_line(&mut result, line);
            continue;
        }
        if in_schema {
            push_line(&mut result, line);
            continue;
        }

        if !in_code
            && let Some(captures) = COMMENTED_MAPPING.captures(line)
        {
            code_indent = captures.get(1).map_or(0, |m| m.len());
            in_code = true;
        }

        if in_code {
            if COMMENT.is_match(line) {
                let stripped = line.get(code_indent..).unwrap_or_default();
                let valid_len = buffer.len();
                push_line(&mut buffer, stripped);
                if serde_yaml::from_str::<Value>(&buffer).is_err() {
                    buffer.truncate(valid_len);
                    push_line(&mut buffer, line);
                }
            } else {
                push_line(&mut buffer, line);
            }
            continue;
        }

        push_line(&mut result, line);
    }

    result.push_str(&buffer);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_patterns() {
        assert!(COMMENT.is_match("  # foo"));
        assert!(COMMENTED_MAPPING.is_match("# foo: bar"));
        assert!(!COMMENTED_MAPPING.is_match("# just prose"));
        assert!(SCHEMA_MARKER.is_match("  # @schema"));
    }

    #[test]
    fn test_commented_mapping_becomes_values() {
        let output = uncomment("# foo: bar\nreal: 1\n");
        assert_eq!(output, "foo: bar\nreal: 1\n");
    }

    #[test]
    fn test_nested_commented_block() {
        let output = uncomment("# resources:\n#   limits:\n#     cpu: 100m\n");
        assert_eq!(output, "resources:\n  limits:\n    cpu: 100m\n");
    }

    #[test]
    fn test_schema_blocks_are_kept() {
        let source = "# @schema\n# type: string\n# @schema\nname: x\n";
        assert_eq!(uncomment(source), source);
    }

    #[test]
    fn test_invalid_yaml_stays_commented() {
        let source = "# note: this: is not yaml\nkey: 1\n";
        assert_eq!(uncomment(source), source);
    }

    #[test]
    fn test_plain_comments_are_untouched() {
        let source = "# just prose\nkey: 1\n";
        assert_eq!(uncomment(source), source);
    }
}
