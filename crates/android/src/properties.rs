//! `key.properties` codec
//!
//! Reads and writes the subset of the Java properties format that Gradle's
//! `Properties.load` accepts for signing credentials:
//!
//! - `#` and `!` comment lines, blank lines
//! - `key=value` or `key: value`, whitespace around the key and before the value ignored
//! - trailing-backslash line continuation
//! - `\t \n \r \f \\ \uXXXX` escapes, `\c` for any other char yields `c`
//!
//! Lines without a separator are rejected instead of being read as a key
//! with an empty value.

use std::fmt;
use thiserror::Error;
use tracing::warn;

/// A problem at a specific line of a properties document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct PropertiesError {
    /// 1-based line where the logical line starts
    pub line: usize,
    /// What is wrong
    pub message: String,
}

impl PropertiesError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    line: usize,
}

/// Ordered key/value pairs with their source lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<Entry>,
}

impl Properties {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        for (line, raw) in logical_lines(text) {
            let (raw_key, raw_value) = split_separator(&raw)
                .ok_or_else(|| PropertiesError::new(line, "Expected `key=value`, found no separator"))?;

            let key = unescape(trim_unescaped_end(raw_key).trim_start(), line)?;
            if key.is_empty() {
                return Err(PropertiesError::new(line, "Empty key before separator"));
            }
            let value = unescape(raw_value.trim_start(), line)?;

            if let Some(previous) = props.line_of(&key) {
                warn!(key = %key, previous, line, "duplicate key, later value wins");
            }
            props.insert_at(key, value, line);
        }
        Ok(props)
    }

    /// Decode file bytes: UTF-8 when valid, ISO-8859-1 otherwise (the
    /// encoding `java.util.Properties` reads by default)
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, PropertiesError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(_) => {
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                Self::parse(&text)
            }
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Line a key was read from. `None` for missing or inserted keys.
    pub fn line_of(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.line)
            .filter(|&l| l > 0)
    }

    /// Set a value, replacing any existing one in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_at(key.into(), value.into(), 0);
    }

    fn insert_at(&mut self, key: String, value: String, line: usize) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value;
                entry.line = line;
            }
            None => self.entries.push(Entry { key, value, line }),
        }
    }

    /// Keys in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{}={}",
                escape(&entry.key, true),
                escape(&entry.value, false)
            )?;
        }
        Ok(())
    }
}

/// Join continuation lines and drop comments, yielding `(start_line, text)`
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((idx, physical)) = lines.next() {
        let start = idx + 1;
        let trimmed = physical.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = String::new();
        let mut current = trimmed;
        loop {
            if ends_with_continuation(current) {
                logical.push_str(&current[..current.len() - 1]);
                match lines.next() {
                    Some((_, next)) => current = next.trim_start(),
                    None => break,
                }
            } else {
                logical.push_str(current);
                break;
            }
        }
        out.push((start, logical));
    }
    out
}

fn ends_with_continuation(line: &str) -> bool {
    let slashes = line.chars().rev().take_while(|&c| c == '\\').count();
    slashes % 2 == 1
}

/// Split at the first unescaped `=` or `:`
fn split_separator(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Drop trailing whitespace unless a backslash escapes it
fn trim_unescaped_end(raw: &str) -> &str {
    let mut end = raw.len();
    while let Some(c) = raw[..end].chars().next_back().filter(|c| c.is_whitespace()) {
        let before = &raw[..end - c.len_utf8()];
        let slashes = before.chars().rev().take_while(|&b| b == '\\').count();
        if slashes % 2 == 1 {
            break;
        }
        end = before.len();
    }
    &raw[..end]
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut buf = [0u16; 2];

    while let Some(c) = chars.next() {
        let decoded = if c == '\\' {
            match chars.next() {
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('f') => '\u{c}',
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let unit = (hex.len() == 4)
                        .then(|| u16::from_str_radix(&hex, 16).ok())
                        .flatten()
                        .ok_or_else(|| {
                            PropertiesError::new(line, format!("Malformed \\uXXXX escape: \\u{hex}"))
                        })?;
                    units.push(unit);
                    continue;
                }
                Some(other) => other,
                None => continue,
            }
        } else {
            c
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    String::from_utf16(&units)
        .map_err(|_| PropertiesError::new(line, "Unpaired surrogate in \\u escape"))
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u16; 2];
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}
