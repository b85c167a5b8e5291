//! Placeholder resolution for the template name and directory fields.
//!
//! Bindings are added in four fixed passes, since later values embed
//! earlier ones:
//! 1. identity (`type`, `release`, `arch`, `image`, `date`, `build_name`)
//!    and `out` resolve the template name;
//! 2. `name` resolves `src_dir` and `out_dir`;
//! 3. those two resolve the remaining directories;
//! 4. every directory is bound and all directories are resolved again.
//!
//! Chains deeper than that stay unresolved. Any placeholder left in a
//! directory afterwards, bound or not, is reported.

use thiserror::Error;

use packstead_settings::VarBindings;

use super::dirs::{ResolvedDirs, OUT_ROOT};
use super::raw::RawTemplate;

/// A directory field still holds a placeholder after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {value}: unresolved placeholder {placeholder}")]
pub struct UnresolvedPlaceholder {
    pub field: &'static str,
    pub value: String,
    pub placeholder: String,
}

fn resolve_dir(vars: &VarBindings, value: &str) -> String {
    let resolved = vars.resolve(value);
    match resolved.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => resolved,
    }
}

impl RawTemplate {
    /// Run the resolution passes, storing the bindings, the resolved
    /// name and the resolved directories on the template.
    pub fn resolve_vars(&mut self) -> Result<ResolvedDirs, UnresolvedPlaceholder> {
        let mut vars = VarBindings::new(self.delim);
        let mut dirs = ResolvedDirs::with_defaults(&self.dirs, self.delim);

        // Pass 1
        vars.bind("type", self.identity.distro.as_str());
        vars.bind("distro", self.identity.distro.as_str());
        vars.bind("release", self.identity.release.as_str());
        vars.bind("arch", self.identity.arch.as_str());
        vars.bind("image", self.identity.image.as_str());
        vars.bind("date", self.date.as_str());
        vars.bind("build_name", self.build_name());
        vars.bind("out", OUT_ROOT);
        let pattern = self
            .info
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| vars.placeholder("build_name"));
        let name = vars.resolve(&pattern);

        // Pass 2
        vars.bind("name", name.as_str());
        dirs.src_dir = resolve_dir(&vars, &dirs.src_dir);
        dirs.out_dir = resolve_dir(&vars, &dirs.out_dir);

        // Pass 3
        vars.bind("src_dir", dirs.src_dir.as_str());
        vars.bind("out_dir", dirs.out_dir.as_str());
        for (field, value) in dirs.entries_mut().into_iter().skip(2) {
            tracing::trace!(field, value = %value, "resolving directory");
            *value = resolve_dir(&vars, value);
        }

        // Pass 4
        for (field, value) in dirs.entries() {
            vars.bind(field, value);
        }
        for (_, value) in dirs.entries_mut() {
            *value = resolve_dir(&vars, value);
        }
        for (field, value) in dirs.entries() {
            vars.bind(field, value);
        }

        for (field, value) in dirs.entries() {
            if let Some(placeholder) = vars.residual_placeholder(value) {
                return Err(UnresolvedPlaceholder {
                    field,
                    value: value.to_string(),
                    placeholder,
                });
            }
        }

        self.vars = vars;
        self.name = name;
        self.resolved = Some(dirs.clone());
        Ok(dirs)
    }
}
