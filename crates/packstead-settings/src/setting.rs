//! The `key=value` micro-format.

use std::fmt;

use crate::error::SettingsError;

/// One parsed setting.
///
/// An empty `value` marks the key as deleted: it still overrides the same
/// key from a lower layer, but consumers must treat it as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when this setting is a `key=` delete marker.
    pub fn is_deleted(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Split a line on its first `=`, trimming whitespace around both halves.
///
/// The value may itself contain `=`.
pub fn parse_setting(line: &str) -> Result<Setting, SettingsError> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| SettingsError::MissingSeparator {
            line: line.to_string(),
        })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(SettingsError::EmptyKey {
            line: line.to_string(),
        });
    }
    Ok(Setting::new(key, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_around_separator() {
        let s = parse_setting("  ssh_port = 22 ").unwrap();
        assert_eq!(s.key, "ssh_port");
        assert_eq!(s.value, "22");
    }

    #[test]
    fn test_value_keeps_embedded_equals() {
        let s = parse_setting("boot_command=preseed/url=http://x/preseed.cfg").unwrap();
        assert_eq!(s.key, "boot_command");
        assert_eq!(s.value, "preseed/url=http://x/preseed.cfg");
    }

    #[test]
    fn test_empty_value_is_delete_marker() {
        let s = parse_setting("guest_os_type=").unwrap();
        assert!(s.is_deleted());
        assert_eq!(s.to_string(), "guest_os_type=");
    }

    #[test]
    fn test_missing_separator_rejected() {
        let err = parse_setting("headless").unwrap_err();
        assert_eq!(
            err,
            SettingsError::MissingSeparator {
                line: "headless".to_string()
            }
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            parse_setting(" =value"),
            Err(SettingsError::EmptyKey { .. })
        ));
    }
}
