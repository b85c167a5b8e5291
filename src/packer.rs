//! The Packer template written for each build.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::SettingsMap;

/// A complete Packer template: targets in type-list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackerTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_packer_version: Option<String>,
    pub builders: Vec<SettingsMap>,
    #[serde(rename = "post-processors", default, skip_serializing_if = "Vec::is_empty")]
    pub post_processors: Vec<SettingsMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provisioners: Vec<SettingsMap>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl PackerTemplate {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to `path`, creating parent directories.
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    }

    /// Every builder's `type`, in order.
    pub fn builder_types(&self) -> Vec<&str> {
        self.builders
            .iter()
            .filter_map(|b| b.get("type").and_then(|t| t.as_str()))
            .collect()
    }
}
