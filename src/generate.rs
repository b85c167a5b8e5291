//! Generating templates for distro builds, named builds and build lists.
//!
//! Every build is generated from its own clone of the distro template, so
//! one failing build never affects another in the same batch.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Catalog, ConfigError};
use crate::diagnostics::Diagnostics;
use crate::packer::PackerTemplate;
use crate::template::{Collaborators, RawTemplate, ResolvedDirs, TemplateError};

/// Errors generating one build, tagged with the build's name.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{build}: {source}")]
    Config {
        build: String,
        #[source]
        source: ConfigError,
    },

    #[error("{build}: {source}")]
    Template {
        build: String,
        #[source]
        source: TemplateError,
    },

    #[error("{build}: {}: {source}", path.display())]
    Write {
        build: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    pub fn build(&self) -> &str {
        match self {
            GenerateError::Config { build, .. }
            | GenerateError::Template { build, .. }
            | GenerateError::Write { build, .. } => build,
        }
    }
}

/// Arch, image and release requested for a distro build.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub arch: Option<String>,
    pub image: Option<String>,
    pub release: Option<String>,
}

/// One generated build.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBuild {
    /// The build's name: a named build's key, or the distro build name.
    pub build: String,
    /// The resolved template name.
    pub name: String,
    pub template: PackerTemplate,
    pub dirs: ResolvedDirs,
    /// Script names referenced by provisioners, for copying.
    pub scripts: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl GeneratedBuild {
    /// Where the template is written: `{root}/{out_dir}/{name}.json`.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dirs.out_dir).join(format!("{}.json", self.name))
    }

    pub fn write(&self, root: &Path) -> Result<PathBuf, GenerateError> {
        let path = self.output_path(root);
        self.template
            .write_to_file(&path)
            .map_err(|source| GenerateError::Write {
                build: self.build.clone(),
                path: path.clone(),
                source,
            })?;
        info!(build = %self.build, path = %path.display(), "template written");
        Ok(path)
    }
}

/// Generates builds from a loaded catalog.
pub struct Generator<'a> {
    catalog: &'a Catalog,
    collab: Collaborators<'a>,
    date: NaiveDate,
    delim: char,
    /// Distro templates already layered, cloned for each build.
    distros: BTreeMap<String, RawTemplate>,
}

impl<'a> Generator<'a> {
    pub fn new(catalog: &'a Catalog, collab: Collaborators<'a>, date: NaiveDate, delim: char) -> Self {
        Self {
            catalog,
            collab,
            date,
            delim,
            distros: BTreeMap::new(),
        }
    }

    /// Generate the default build for `distro`.
    pub fn distro(
        &mut self,
        distro: &str,
        selection: &Selection,
    ) -> Result<GeneratedBuild, GenerateError> {
        let catalog = self.catalog;
        let mut raw = self.distro_template(distro).map_err(|source| GenerateError::Config {
            build: distro.to_string(),
            source,
        })?;
        let def = catalog.distro(distro).map_err(|source| GenerateError::Config {
            build: distro.to_string(),
            source,
        })?;
        raw.select(
            def,
            selection.arch.as_deref(),
            selection.image.as_deref(),
            selection.release.as_deref(),
        )
        .map_err(|source| GenerateError::Config {
            build: distro.to_string(),
            source,
        })?;
        self.finish(raw)
    }

    /// Generate a named build.
    pub fn named(&mut self, name: &str) -> Result<GeneratedBuild, GenerateError> {
        let config_err = |source| GenerateError::Config {
            build: name.to_string(),
            source,
        };
        let catalog = self.catalog;
        let def = catalog.build(name).map_err(config_err)?;
        let base = self.distro_template(&def.distro).map_err(config_err)?;
        let distro = catalog.distro(&def.distro).map_err(config_err)?;
        let raw = base.derive(name, def, distro).map_err(config_err)?;
        self.finish(raw)
    }

    /// Generate each named build, isolating failures per build.
    pub fn batch<I, S>(&mut self, names: I) -> Vec<(String, Result<GeneratedBuild, GenerateError>)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                let result = self.named(name);
                if let Err(e) = &result {
                    warn!(build = name, error = %e, "build failed");
                }
                (name.to_string(), result)
            })
            .collect()
    }

    /// Generate every build in a build list.
    pub fn list(
        &mut self,
        list: &str,
    ) -> Result<Vec<(String, Result<GeneratedBuild, GenerateError>)>, ConfigError> {
        let names = self.catalog.list(list)?.builds.clone();
        info!(list, builds = names.len(), "generating build list");
        Ok(self.batch(names))
    }

    fn distro_template(&mut self, distro: &str) -> Result<RawTemplate, ConfigError> {
        if let Some(raw) = self.distros.get(distro) {
            return Ok(raw.clone());
        }
        let raw = RawTemplate::for_distro(self.catalog, distro, self.date, self.delim)?;
        self.distros.insert(distro.to_string(), raw.clone());
        Ok(raw)
    }

    fn finish(&self, mut raw: RawTemplate) -> Result<GeneratedBuild, GenerateError> {
        let build = raw.build_name();
        debug!(build = %build, distro = %raw.identity.distro, "generating");
        let mut diagnostics = Diagnostics::new();
        let template = raw
            .create_packer_template(self.collab, &mut diagnostics)
            .map_err(|source| GenerateError::Template {
                build: build.clone(),
                source,
            })?;
        let dirs = raw
            .resolved_dirs()
            .cloned()
            .unwrap_or_else(|| ResolvedDirs::with_defaults(&raw.dirs, raw.delim));
        Ok(GeneratedBuild {
            build,
            name: raw.name().to_string(),
            template,
            dirs,
            scripts: raw.script_names().to_vec(),
            diagnostics,
        })
    }
}
