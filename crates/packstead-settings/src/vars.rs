//! Placeholder bindings and substitution.
//!
//! A placeholder is the delimiter immediately followed by a bare name, for
//! example `:out_dir`. Substitution is case-sensitive and replaces every
//! occurrence. It does not recurse: a substituted value containing
//! another placeholder stays as-is until the caller resolves it again.

use std::collections::BTreeMap;

/// Delimiter used when configuration does not name one.
pub const DEFAULT_DELIMITER: char = ':';

/// Placeholder → value map. Keys are stored with the delimiter prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBindings {
    delim: char,
    values: BTreeMap<String, String>,
}

impl Default for VarBindings {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl VarBindings {
    pub fn new(delim: char) -> Self {
        Self {
            delim,
            values: BTreeMap::new(),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delim
    }

    /// The placeholder text for `name`, e.g. `:out_dir`.
    pub fn placeholder(&self, name: &str) -> String {
        format!("{}{}", self.delim, name)
    }

    /// Bind `name` (without delimiter) to `value`, replacing any earlier binding.
    pub fn bind(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(self.placeholder(name), value.into());
    }

    /// Value bound to `name` (without delimiter).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&self.placeholder(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Placeholders and values, keyed with the delimiter.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand every bound placeholder in `s`.
    pub fn resolve(&self, s: &str) -> String {
        if !s.contains(self.delim) {
            return s.to_string();
        }
        resolve(s, &self.values)
    }

    /// First placeholder-shaped token left in `s`, bound or not.
    ///
    /// A token is the delimiter followed by at least one ASCII letter,
    /// digit or underscore, so `C:/dir` and `http://host` have none.
    pub fn residual_placeholder(&self, s: &str) -> Option<String> {
        let mut chars = s.char_indices().peekable();
        while let Some((start, c)) = chars.next() {
            if c != self.delim {
                continue;
            }
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_name_char(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            if end > start + c.len_utf8() {
                return Some(s[start..end].to_string());
            }
        }
        None
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand the placeholder keys of `bindings` found in `s`.
///
/// `s` is scanned once from the left. At each position the longest key
/// that matches is replaced by its value, and scanning carries on after
/// the match, so substituted text is never expanded again. Keys carry
/// their delimiter.
pub fn resolve(s: &str, bindings: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        let hit = bindings
            .iter()
            .filter(|(key, _)| !key.is_empty() && rest.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len());
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}
