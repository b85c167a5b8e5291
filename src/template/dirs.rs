//! Directory fields.
//!
//! Every directory may embed placeholders, including other directories,
//! so they are stored unresolved until the template resolves them.

use serde::{Deserialize, Serialize};

/// Value of the `out` placeholder, the directory generated output sits
/// under unless `out_dir` says otherwise.
pub const OUT_ROOT: &str = "out";

/// Directory field names, in resolution order.
pub const DIR_FIELDS: [&str; 7] = [
    "src_dir",
    "out_dir",
    "commands_src_dir",
    "http_dir",
    "http_src_dir",
    "scripts_dir",
    "scripts_src_dir",
];

/// Directory fields as written in a configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoDirs {
    /// Root of the build's source files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_dir: Option<String>,

    /// Where the generated template is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Where `.command` files are looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands_src_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_src_dir: Option<String>,

    /// Script path prefix used in provisioner output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_src_dir: Option<String>,
}

impl IoDirs {
    fn fields(&self) -> [&Option<String>; 7] {
        [
            &self.src_dir,
            &self.out_dir,
            &self.commands_src_dir,
            &self.http_dir,
            &self.http_src_dir,
            &self.scripts_dir,
            &self.scripts_src_dir,
        ]
    }

    fn fields_mut(&mut self) -> [&mut Option<String>; 7] {
        [
            &mut self.src_dir,
            &mut self.out_dir,
            &mut self.commands_src_dir,
            &mut self.http_dir,
            &mut self.http_src_dir,
            &mut self.scripts_dir,
            &mut self.scripts_src_dir,
        ]
    }

    /// Take every non-empty field from `newer`.
    pub fn update(&mut self, newer: &IoDirs) {
        for (mine, theirs) in self.fields_mut().into_iter().zip(newer.fields()) {
            if let Some(v) = theirs.as_ref().filter(|v| !v.is_empty()) {
                *mine = Some(v.clone());
            }
        }
    }
}

/// Directory fields with defaults applied; resolved in place by the
/// template's resolution passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDirs {
    pub src_dir: String,
    pub out_dir: String,
    pub commands_src_dir: String,
    pub http_dir: String,
    pub http_src_dir: String,
    pub scripts_dir: String,
    pub scripts_src_dir: String,
}

impl ResolvedDirs {
    /// Start from `dirs`, filling unset fields with their defaults.
    ///
    /// `delim` is the placeholder delimiter the defaults are written with.
    pub fn with_defaults(dirs: &IoDirs, delim: char) -> Self {
        let or = |field: &Option<String>, default: String| {
            field
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        Self {
            src_dir: or(&dirs.src_dir, "src".to_string()),
            out_dir: or(&dirs.out_dir, format!("{delim}out/{delim}build_name")),
            commands_src_dir: or(&dirs.commands_src_dir, "commands".to_string()),
            http_dir: or(&dirs.http_dir, "http".to_string()),
            http_src_dir: or(&dirs.http_src_dir, format!("{delim}src_dir/http")),
            scripts_dir: or(&dirs.scripts_dir, "scripts".to_string()),
            scripts_src_dir: or(&dirs.scripts_src_dir, format!("{delim}src_dir/scripts")),
        }
    }

    /// `(name, value)` pairs in [`DIR_FIELDS`] order.
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            (DIR_FIELDS[0], self.src_dir.as_str()),
            (DIR_FIELDS[1], self.out_dir.as_str()),
            (DIR_FIELDS[2], self.commands_src_dir.as_str()),
            (DIR_FIELDS[3], self.http_dir.as_str()),
            (DIR_FIELDS[4], self.http_src_dir.as_str()),
            (DIR_FIELDS[5], self.scripts_dir.as_str()),
            (DIR_FIELDS[6], self.scripts_src_dir.as_str()),
        ]
    }

    pub(crate) fn entries_mut(&mut self) -> [(&'static str, &mut String); 7] {
        [
            (DIR_FIELDS[0], &mut self.src_dir),
            (DIR_FIELDS[1], &mut self.out_dir),
            (DIR_FIELDS[2], &mut self.commands_src_dir),
            (DIR_FIELDS[3], &mut self.http_dir),
            (DIR_FIELDS[4], &mut self.http_src_dir),
            (DIR_FIELDS[5], &mut self.scripts_dir),
            (DIR_FIELDS[6], &mut self.scripts_src_dir),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_takes_non_empty_fields() {
        let mut dirs = IoDirs {
            src_dir: Some("src".into()),
            out_dir: Some("out".into()),
            ..Default::default()
        };
        dirs.update(&IoDirs {
            out_dir: Some("build/out".into()),
            src_dir: Some(String::new()),
            scripts_dir: Some("s".into()),
            ..Default::default()
        });
        assert_eq!(dirs.src_dir.as_deref(), Some("src"));
        assert_eq!(dirs.out_dir.as_deref(), Some("build/out"));
        assert_eq!(dirs.scripts_dir.as_deref(), Some("s"));
        assert_eq!(dirs.http_dir, None);
    }

    #[test]
    fn test_defaults_use_delimiter() {
        let resolved = ResolvedDirs::with_defaults(&IoDirs::default(), '%');
        assert_eq!(resolved.out_dir, "%out/%build_name");
        assert_eq!(resolved.scripts_src_dir, "%src_dir/scripts");
        assert_eq!(resolved.commands_src_dir, "commands");
    }

    #[test]
    fn test_entries_follow_field_order() {
        let resolved = ResolvedDirs::with_defaults(&IoDirs::default(), ':');
        let names: Vec<_> = resolved.entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, DIR_FIELDS.to_vec());
    }
}
