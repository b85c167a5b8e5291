//! Ordered settings lists and their layered merge.
//!
//! Settings are persisted as flat `key=value` lines but held parsed so
//! every consumer sees typed keys. Merge semantics:
//! - a key present in the newer layer replaces the older value in place
//! - a key only in the newer layer is appended, in the newer layer's order
//! - a key only in the older layer survives unchanged (merge never deletes)
//!
//! Key lookup scans front to back and stops at the first match.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::setting::{parse_setting, Setting};

/// An ordered list of settings for one template section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Settings {
    entries: Vec<Setting>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` lines, keeping their order.
    pub fn parse<I, S>(lines: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines
            .into_iter()
            .map(|line| parse_setting(line.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry, delete markers included.
    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.iter()
    }

    /// Entries that carry a value; `key=` delete markers are skipped.
    pub fn live(&self) -> impl Iterator<Item = &Setting> {
        self.entries.iter().filter(|s| !s.is_deleted())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|s| s.key == key)
    }

    /// Value of the first entry with `key`, or `None` when the key is
    /// absent or deleted.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .map(|i| self.entries[i].value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Whether `key` is present with a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, replacing the first existing entry in place or appending.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let setting = Setting::new(key, value);
        match self.position(&setting.key) {
            Some(i) => self.entries[i] = setting,
            None => self.entries.push(setting),
        }
    }

    /// Merge `newer` on top of `self`.
    pub fn merge_from(&mut self, newer: &Settings) {
        for setting in &newer.entries {
            self.set(setting.key.clone(), setting.value.clone());
        }
    }

    /// The flat `key=value` form used by configuration documents.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries.iter().map(Setting::to_string).collect()
    }
}

/// Merge two settings lists; see the module docs for the rules.
///
/// Both layers go through [`Settings::set`], so the result never holds a
/// key twice, even when one layer repeats a key.
pub fn merge_settings(old: &Settings, new: &Settings) -> Settings {
    let mut merged = Settings::new();
    merged.merge_from(old);
    merged.merge_from(new);
    merged
}

impl TryFrom<Vec<String>> for Settings {
    type Error = SettingsError;

    fn try_from(lines: Vec<String>) -> Result<Self, Self::Error> {
        Settings::parse(lines)
    }
}

impl From<Settings> for Vec<String> {
    fn from(settings: Settings) -> Self {
        settings.to_lines()
    }
}

impl FromIterator<Setting> for Settings {
    fn from_iter<T: IntoIterator<Item = Setting>>(iter: T) -> Self {
        let mut settings = Settings::new();
        for s in iter {
            settings.set(s.key, s.value);
        }
        settings
    }
}
