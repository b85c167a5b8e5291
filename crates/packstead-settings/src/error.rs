//! Errors raised while parsing settings lines.

use thiserror::Error;

/// A settings line that cannot be split into a key and a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{line:?}: setting is not in key=value form")]
    MissingSeparator { line: String },

    #[error("{line:?}: setting has an empty key")]
    EmptyKey { line: String },
}
