//! Template configuration documents
//!
//! Four TOML documents feed template generation:
//! - defaults: application-wide template info, directories and `[build]`
//! - supported: one table per distro with its selections and `[build]`
//! - builds: one table per named build, layered over its distro
//! - build lists: named groups of builds for batch runs
//!
//! The builds and build lists documents are optional.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use packstead_settings::Settings;

use super::effective::{digest_bytes, AppConfig};
use super::ConfigError;
use crate::template::{BuildSections, IoDirs};

/// Template info shared by every layer; unset fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Pattern for the template name; may contain placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_packer_version: Option<String>,
}

impl TemplateInfo {
    pub fn update(&mut self, newer: &TemplateInfo) {
        for (mine, theirs) in [
            (&mut self.name, &newer.name),
            (&mut self.description, &newer.description),
            (&mut self.min_packer_version, &newer.min_packer_version),
        ] {
            if let Some(v) = theirs.as_ref().filter(|v| !v.is_empty()) {
                *mine = Some(v.clone());
            }
        }
    }
}

/// The application defaults document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(flatten)]
    pub info: TemplateInfo,

    #[serde(flatten)]
    pub dirs: IoDirs,

    #[serde(default)]
    pub build: BuildSections,
}

/// One supported distro.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distro {
    /// Supported architectures, e.g. `amd64`, `i386`.
    #[serde(default)]
    pub arch: Vec<String>,

    /// Supported ISO images, e.g. `server`, `Minimal`.
    #[serde(default)]
    pub image: Vec<String>,

    /// Supported releases.
    #[serde(default)]
    pub release: Vec<String>,

    /// Default selection as `arch=`, `image=` and `release=` settings.
    #[serde(default)]
    pub default_image: Settings,

    /// Download mirror root used for release metadata lookups.
    #[serde(default)]
    pub base_url: String,

    #[serde(flatten)]
    pub info: TemplateInfo,

    #[serde(flatten)]
    pub dirs: IoDirs,

    #[serde(default)]
    pub build: BuildSections,
}

impl Distro {
    /// The supported values for a selection field.
    pub fn supported(&self, field: &str) -> &[String] {
        match field {
            "arch" => &self.arch,
            "image" => &self.image,
            "release" => &self.release,
            _ => &[],
        }
    }
}

/// A named build layered over its distro's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildDef {
    /// The distro this build derives from.
    #[serde(rename = "type")]
    pub distro: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(flatten)]
    pub info: TemplateInfo,

    #[serde(flatten)]
    pub dirs: IoDirs,

    #[serde(default)]
    pub build: BuildSections,
}

/// A named group of builds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildList {
    #[serde(default)]
    pub builds: Vec<String>,
}

/// All loaded template documents.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub defaults: Defaults,
    pub distros: BTreeMap<String, Distro>,
    pub builds: BTreeMap<String, BuildDef>,
    pub lists: BTreeMap<String, BuildList>,
}

impl Catalog {
    /// Load every document named by `config`, recording each as a source.
    pub fn load(config: &mut AppConfig) -> Result<Self, ConfigError> {
        let defaults_path = config.defaults_file();
        let (defaults, digest) = load_document::<Defaults>(&defaults_path)?;
        config.record_document(&defaults_path, digest);

        let supported_path = config.supported_file();
        let (distros, digest) = load_document(&supported_path)?;
        config.record_document(&supported_path, digest);

        let mut catalog = Catalog {
            defaults,
            distros,
            ..Default::default()
        };

        let builds_path = config.builds_file();
        if builds_path.exists() {
            let (builds, digest) = load_document(&builds_path)?;
            config.record_document(&builds_path, digest);
            catalog.builds = builds;
        }

        let lists_path = config.build_lists_file();
        if lists_path.exists() {
            let (lists, digest) = load_document(&lists_path)?;
            config.record_document(&lists_path, digest);
            catalog.lists = lists;
        }

        Ok(catalog)
    }

    /// Build a catalog from document text; used by tests and tooling.
    pub fn from_toml(
        defaults: &str,
        supported: &str,
        builds: Option<&str>,
        lists: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Ok(Catalog {
            defaults: parse_document(Path::new("defaults"), defaults)?,
            distros: parse_document(Path::new("supported"), supported)?,
            builds: builds
                .map(|text| parse_document(Path::new("builds"), text))
                .transpose()?
                .unwrap_or_default(),
            lists: lists
                .map(|text| parse_document(Path::new("build_lists"), text))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn distro(&self, name: &str) -> Result<&Distro, ConfigError> {
        self.distros
            .get(name)
            .ok_or_else(|| ConfigError::UnsupportedDistro(name.to_string()))
    }

    pub fn build(&self, name: &str) -> Result<&BuildDef, ConfigError> {
        self.builds
            .get(name)
            .ok_or_else(|| ConfigError::BuildNotFound(name.to_string()))
    }

    pub fn list(&self, name: &str) -> Result<&BuildList, ConfigError> {
        self.lists
            .get(name)
            .ok_or_else(|| ConfigError::BuildListNotFound(name.to_string()))
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<(T, String), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = digest_bytes(&bytes);
    let text = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid UTF-8: {e}"),
    })?;
    Ok((parse_document(path, &text)?, digest))
}

fn parse_document<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
