//! Non-fatal findings collected while generating a template.
//!
//! Unknown settings and arrays are ignored rather than rejected so newer
//! configuration keeps working with older kinds. Every such case is
//! recorded here, in order, and mirrored to the `tracing` warn stream.

use serde::Serialize;
use tracing::warn;

/// One recorded finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The target kind or scope, e.g. `virtualbox-iso` or `shell`.
    pub component: String,
    /// The setting or array name involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
}

/// Ordered sink of diagnostics for one build.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and emit it as a warning.
    pub fn warn(&mut self, component: &str, key: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match key {
            Some(key) => warn!(component, key, "{}", message),
            None => warn!(component, "{}", message),
        }
        self.entries.push(Diagnostic {
            component: component.to_string(),
            key: key.map(str::to_string),
            message,
        });
    }

    pub fn unknown_setting(&mut self, component: &str, key: &str) {
        self.warn(component, Some(key), "unsupported setting ignored");
    }

    pub fn unknown_array(&mut self, component: &str, name: &str) {
        self.warn(component, Some(name), "unsupported array ignored");
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Whether any entry names `component` and `key`.
    pub fn mentions(&self, component: &str, key: &str) -> bool {
        self.entries
            .iter()
            .any(|d| d.component == component && d.key.as_deref() == Some(key))
    }
}
