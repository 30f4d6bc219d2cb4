//! Head-comment scanner
//!
//! `serde_yaml` drops comments, so key comments and positions are recovered
//! with a line-oriented pass over the source text. Every block-style mapping
//! key gets a [`KeyInfo`] addressed by its path from the document root.

use std::collections::HashMap;

/// One step in a path from the document root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Source information recorded for a mapping key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    /// Comment lines directly above the key, `#` markers included;
    /// blank lines between comment paragraphs are kept as empty lines
    pub comment: String,
    /// Zero-based line of the key
    pub line: usize,
    /// Zero-based column of the key
    pub column: usize,
}

/// Editor modeline added by `--add-schema-reference`; never part of a key comment
pub const LANGUAGE_SERVER_MODELINE: &str = "# yaml-language-server:";

/// Key information indexed by path
pub type CommentIndex = HashMap<Vec<PathSegment>, KeyInfo>;

#[derive(Debug)]
enum Frame {
    Key { indent: usize, name: String },
    Item { indent: usize, index: usize },
}

impl Frame {
    const fn indent(&self) -> usize {
        match *self {
            Self::Key { indent, .. } | Self::Item { indent, .. } => indent,
        }
    }

    fn segment(&self) -> PathSegment {
        match self {
            Self::Key { name, .. } => PathSegment::Key(name.clone()),
            Self::Item { index, .. } => PathSegment::Index(*index),
        }
    }
}

#[derive(Debug, Default)]
struct Scanner {
    frames: Vec<Frame>,
    pending: Vec<String>,
    /// Lines indented deeper than this belong to a block scalar
    block_scalar: Option<usize>,
    /// Open bracket depth of a multi-line flow collection
    flow_depth: usize,
    index: CommentIndex,
}

/// Scan YAML source text and index the head comment of every mapping key
#[must_use]
pub fn scan(source: &str) -> CommentIndex {
    let mut scanner = Scanner::default();
    for (line_no, line) in source.lines().enumerate() {
        scanner.line(line_no, line);
    }
    scanner.index
}

impl Scanner {
    fn line(&mut self, line_no: usize, line: &str) {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(parent) = self.block_scalar {
            if trimmed.is_empty() || indent > parent {
                return;
            }
            self.block_scalar = None;
        }
        if self.flow_depth > 0 {
            self.flow_depth = bracket_depth(trimmed, self.flow_depth);
            return;
        }

        if trimmed.is_empty() {
            if !self.pending.is_empty() {
                self.pending.push(String::new());
            }
            return;
        }
        if trimmed.starts_with('#') {
            if !trimmed.starts_with(LANGUAGE_SERVER_MODELINE) {
                self.pending.push(trimmed.trim_end().to_owned());
            }
            return;
        }
        if trimmed.starts_with("---") || trimmed.starts_with("...") || trimmed.starts_with('%') {
            return;
        }

        let mut column = indent;
        let mut rest = trimmed;
        while let Some(after) = strip_dash(rest) {
            self.enter_item(column);
            let content = after.trim_start();
            column += rest.len() - content.len();
            rest = content;
        }

        if let Some((key, value)) = split_key(rest) {
            self.enter_key(key, line_no, column);
            self.after_value(value.trim(), column);
        } else {
            self.after_value(rest.trim(), column.saturating_sub(1));
        }
        self.pending.clear();
    }

    fn enter_item(&mut self, column: usize) {
        while self.frames.last().is_some_and(|f| f.indent() > column) {
            self.frames.pop();
        }
        match self.frames.last_mut() {
            Some(Frame::Item { indent, index }) if *indent == column => *index += 1,
            _ => self.frames.push(Frame::Item {
                indent: column,
                index: 0,
            }),
        }
    }

    fn enter_key(&mut self, name: String, line: usize, column: usize) {
        while self.frames.last().is_some_and(|f| f.indent() >= column) {
            self.frames.pop();
        }
        let mut path: Vec<PathSegment> = self.frames.iter().map(Frame::segment).collect();
        path.push(PathSegment::Key(name.clone()));

        self.index.insert(
            path,
            KeyInfo {
                comment: take_comment(&mut self.pending),
                line,
                column,
            },
        );
        self.frames.push(Frame::Key {
            indent: column,
            name,
        });
    }

    /// Track values that span several lines
    fn after_value(&mut self, value: &str, parent_indent: usize) {
        if value.starts_with('|') || value.starts_with('>') {
            self.block_scalar = Some(parent_indent);
        } else if value.starts_with('[') || value.starts_with('{') {
            self.flow_depth = bracket_depth(value, 0);
        }
    }
}

fn take_comment(pending: &mut Vec<String>) -> String {
    while pending.last().is_some_and(String::is_empty) {
        pending.pop();
    }
    let comment = pending.join("\n");
    pending.clear();
    comment
}

/// Strip a block sequence indicator, returning the remaining text
fn strip_dash(text: &str) -> Option<&str> {
    if text == "-" {
        return Some("");
    }
    text.strip_prefix("- ")
        .or_else(|| text.strip_prefix("-\t"))
}

/// Split `key: value` into the unquoted key and the value text
fn split_key(text: &str) -> Option<(String, &str)> {
    let first = text.chars().next()?;
    if matches!(first, '[' | '{' | '|' | '>' | '#' | '?' | '&' | '*' | '!') {
        return None;
    }
    if first == '"' || first == '\'' {
        let (key, consumed) = quoted(text, first)?;
        let rest = text[consumed..].trim_start();
        let value = rest.strip_prefix(':')?;
        if !value.is_empty() && !value.starts_with([' ', '\t']) {
            return None;
        }
        return Some((key, value));
    }

    let bytes = text.as_bytes();
    for (pos, byte) in bytes.iter().enumerate() {
        match *byte {
            b'#' if pos > 0 && bytes[pos - 1].is_ascii_whitespace() => return None,
            b':' => {
                let next = bytes.get(pos + 1);
                if next.is_none_or(|b| *b == b' ' || *b == b'\t') {
                    let key = text[..pos].trim_end();
                    return Some((key.to_owned(), &text[pos + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a quoted scalar at the start of `text`, returning it with the number
/// of bytes consumed
fn quoted(text: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' if quote == '"' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
            }
            '\'' if quote == '\'' && chars.peek().is_some_and(|(_, c)| *c == '\'') => {
                chars.next();
                value.push('\'');
            }
            c if c == quote => return Some((value, pos + c.len_utf8())),
            c => value.push(c),
        }
    }
    None
}

/// Bracket depth after scanning `text`, starting from `depth`
fn bracket_depth(text: &str, mut depth: usize) -> usize {
    let mut in_quote: Option<char> = None;
    for ch in text.chars() {
        match (in_quote, ch) {
            (Some(q), c) if c == q => in_quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => in_quote = Some(ch),
            (None, '#') => break,
            (None, '[' | '{') => depth += 1,
            (None, ']' | '}') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Render a path for messages, e.g. `image.pullSecrets[0].name`
#[must_use]
pub fn display_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    fn key(path: &[&str]) -> Vec<PathSegment> {
        path.iter()
            .map(|p| {
                p.parse::<usize>()
                    .map_or_else(|_| PathSegment::Key((*p).to_owned()), PathSegment::Index)
            })
            .collect()
    }

    #[test]
    fn test_nested_key_comments() {
        let index = scan("# top\nimage:\n  # the repo\n  repository: nginx\n  tag: latest\n");
        assert_eq!(index[&key(&["image"])].comment, "# top");
        assert_eq!(index[&key(&["image", "repository"])].comment, "# the repo");
        assert_eq!(index[&key(&["image", "tag"])].comment, "");
        assert_eq!(index[&key(&["image", "tag"])].line, 4);
        assert_eq!(index[&key(&["image", "tag"])].column, 2);
    }

    #[test]
    fn test_paragraphs_are_kept_with_blank_lines() {
        let index = scan("# first\n\n# second\nkey: 1\n");
        assert_eq!(index[&key(&["key"])].comment, "# first\n\n# second");
    }

    #[test]
    fn test_language_server_modeline_is_not_a_comment() {
        let index = scan("# yaml-language-server: $schema=values.schema.json\n# desc\nkey: 1\n");
        assert_eq!(index[&key(&["key"])].comment, "# desc");
    }

    #[test]
    fn test_sequence_items_are_indexed() {
        let source = "list:\n- name: a\n  # port of b\n  port: 1\n- name: b\n  port: 2\n";
        let index = scan(source);
        assert!(index.contains_key(&key(&["list", "0", "name"])));
        assert_eq!(index[&key(&["list", "0", "port"])].comment, "# port of b");
        assert_eq!(index[&key(&["list", "1", "port"])].line, 5);
    }

    #[test]
    fn test_block_scalars_are_skipped() {
        let source = "script: |\n  # not a comment\n  fake: key\n# real\nnext: 1\n";
        let index = scan(source);
        assert!(!index.contains_key(&key(&["script", "fake"])));
        assert_eq!(index[&key(&["next"])].comment, "# real");
    }

    #[test]
    fn test_flow_collections_are_skipped() {
        let source = "list: [\n  a: 1,\n]\nother: 2\n";
        let index = scan(source);
        assert_eq!(index.len(), 2);
        assert!(index.contains_key(&key(&["other"])));
    }

    #[test]
    fn test_quoted_keys() {
        let (name, rest) = split_key("\"a: b\": 1").unwrap();
        assert_eq!(name, "a: b");
        assert_eq!(rest.trim(), "1");
        assert_eq!(split_key("'it''s': x").unwrap().0, "it's");
        assert!(split_key("http://example.com").is_none());
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(&key(&["a", "0", "b"])), "a[0].b");
    }
}
