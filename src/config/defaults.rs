//! Built-in application defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in application configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Application defaults document (default: "conf/defaults.toml")
    pub defaults_file: String,

    /// Supported distros document (default: "conf/supported.toml")
    pub supported_file: String,

    /// Named builds document (default: "conf/builds.toml")
    pub builds_file: String,

    /// Build lists document (default: "conf/build_lists.toml")
    pub build_lists_file: String,

    /// Placeholder delimiter (default: ":")
    pub param_delim: String,

    /// Log level for the CLI (default: "info")
    pub log_level: String,

    /// Release page fetch timeout in seconds (default: 30)
    pub fetch_timeout_seconds: u64,

    /// Directory relative output paths are rooted at (default: ".")
    pub output_root: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            defaults_file: "conf/defaults.toml".to_string(),
            supported_file: "conf/supported.toml".to_string(),
            builds_file: "conf/builds.toml".to_string(),
            build_lists_file: "conf/build_lists.toml".to_string(),
            param_delim: ":".to_string(),
            log_level: "info".to_string(),
            fetch_timeout_seconds: 30,
            output_root: ".".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "files": {
                "defaults": self.defaults_file,
                "supported": self.supported_file,
                "builds": self.builds_file,
                "build_lists": self.build_lists_file
            },
            "param_delim": self.param_delim,
            "log_level": self.log_level,
            "fetch_timeout_seconds": self.fetch_timeout_seconds,
            "output_root": self.output_root
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.param_delim, ":");
        assert_eq!(defaults.fetch_timeout_seconds, 30);
        assert_eq!(defaults.defaults_file, "conf/defaults.toml");
        assert_eq!(defaults.log_level, "info");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["files"]["supported"], "conf/supported.toml");
        assert_eq!(value["param_delim"], ":");
        assert_eq!(value["fetch_timeout_seconds"], 30);
    }
}
