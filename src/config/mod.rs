//! Configuration
//!
//! Two concerns live here:
//! - the application configuration, merged from four layers:
//!   1. Built-in defaults
//!   2. User config (~/.config/packstead/config.toml)
//!   3. Project config (./packstead.toml)
//!   4. CLI flags
//! - the template documents that config points at: application
//!   defaults, supported distros, named builds and build lists.

mod defaults;
mod documents;
mod effective;
mod merge;

use std::io;
use std::path::PathBuf;

pub use defaults::BuiltinDefaults;
pub use documents::{BuildDef, BuildList, Catalog, Defaults, Distro, TemplateInfo};
pub use effective::{
    digest_bytes, project_config_path, user_config_path, AppConfig, ConfigOrigin, ConfigSource,
};
pub use merge::{merge_layers, overlay};

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("{0}: distro not supported")]
    UnsupportedDistro(String),

    #[error("{0}: build not found")]
    BuildNotFound(String),

    #[error("{0}: build list not found")]
    BuildListNotFound(String),

    #[error("{distro}: {field} {value:?} not supported; expected one of: {}", supported.join(", "))]
    UnsupportedSelection {
        distro: String,
        field: &'static str,
        value: String,
        supported: Vec<String>,
    },

    #[error("{distro}: no {field} selected and default_image does not set one")]
    MissingSelection { distro: String, field: &'static str },
}
