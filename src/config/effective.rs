//! Effective application configuration with provenance
//!
//! Records the merged configuration together with every file that
//! contributed to it and a digest of that file's bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::ConfigError;

/// Schema identifier for `packstead config` output
pub const SCHEMA_ID: &str = "packstead/effective_config@1";

/// Upper bound for `fetch_timeout_seconds`
pub const MAX_FETCH_TIMEOUT_SECONDS: u64 = 600;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Project,
    Cli,
    Document,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    fn file(origin: ConfigOrigin, path: &Path, digest: String) -> Self {
        Self {
            origin,
            path: Some(path.display().to_string()),
            digest: Some(digest),
        }
    }

    fn inline(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
        }
    }
}

/// Merged application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Default user config location, `~/.config/packstead/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/packstead/config.toml"))
}

/// Default project config location.
pub fn project_config_path() -> PathBuf {
    PathBuf::from("packstead.toml")
}

impl AppConfig {
    /// Build the effective config from layers.
    pub fn build(
        user_config_path: Option<&Path>,
        project_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource::inline(ConfigOrigin::Builtin)];

        for (origin, path) in [
            (ConfigOrigin::User, user_config_path),
            (ConfigOrigin::Project, project_config_path),
        ] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource::file(origin, path, digest));
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource::inline(ConfigOrigin::Cli));
        }

        let merged = merge_layers(layers);
        validate_config(&merged)?;

        Ok(Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Record a configuration document that was read under this config.
    pub fn record_document(&mut self, path: &Path, digest: String) {
        self.sources
            .push(ConfigSource::file(ConfigOrigin::Document, path, digest));
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    fn path_of(&self, key: &str) -> PathBuf {
        let fallback = BuiltinDefaults::default().to_value();
        let raw = self
            .get_str(&format!("files.{key}"))
            .or_else(|| fallback["files"][key].as_str())
            .unwrap_or_default();
        PathBuf::from(raw)
    }

    pub fn defaults_file(&self) -> PathBuf {
        self.path_of("defaults")
    }

    pub fn supported_file(&self) -> PathBuf {
        self.path_of("supported")
    }

    pub fn builds_file(&self) -> PathBuf {
        self.path_of("builds")
    }

    pub fn build_lists_file(&self) -> PathBuf {
        self.path_of("build_lists")
    }

    /// Placeholder delimiter; validated to be a single character.
    pub fn param_delim(&self) -> char {
        self.get_str("param_delim")
            .and_then(|s| s.chars().next())
            .unwrap_or(packstead_settings::DEFAULT_DELIMITER)
    }

    pub fn log_level(&self) -> &str {
        self.get_str("log_level").unwrap_or("info")
    }

    pub fn fetch_timeout(&self) -> Duration {
        let secs = self
            .get("fetch_timeout_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(BuiltinDefaults::default().fetch_timeout_seconds);
        Duration::from_secs(secs)
    }

    pub fn output_root(&self) -> PathBuf {
        PathBuf::from(self.get_str("output_root").unwrap_or("."))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Hex SHA-256 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Load and parse a TOML file, returning the JSON value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = digest_bytes(&bytes);

    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid UTF-8: {e}"),
    })?;
    let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok((toml_to_json(toml_value), digest))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            Value::Object(table.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect())
        }
    }
}

fn validate_config(config: &Value) -> Result<(), ConfigError> {
    if let Some(delim) = config.get("param_delim") {
        let delim = delim.as_str().unwrap_or_default();
        let mut chars = delim.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_alphanumeric() && !c.is_whitespace() && c != '_' => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "param_delim must be a single punctuation character, got {delim:?}"
                )))
            }
        }
    }

    if let Some(timeout) = config.get("fetch_timeout_seconds") {
        match timeout.as_u64() {
            Some(secs) if secs > 0 && secs <= MAX_FETCH_TIMEOUT_SECONDS => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "fetch_timeout_seconds must be in (0, {MAX_FETCH_TIMEOUT_SECONDS}]"
                )))
            }
        }
    }

    if let Some(level) = config.get("log_level") {
        let valid = level
            .as_str()
            .map(|s| s.parse::<tracing::Level>().is_ok())
            .unwrap_or(false);
        if !valid {
            return Err(ConfigError::Validation(format!(
                "log_level must be one of error, warn, info, debug, trace; got {level}"
            )));
        }
    }

    Ok(())
}
