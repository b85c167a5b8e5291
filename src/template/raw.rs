//! The per-build template aggregate.

use chrono::NaiveDate;
use serde::Serialize;

use packstead_settings::VarBindings;

use super::dirs::{IoDirs, ResolvedDirs};
use super::section::{BuildSections, TemplateSection, COMMON};
use super::TemplateError;
use crate::builders;
use crate::commands::LineSource;
use crate::component::{ComponentContext, ComponentError, SettingsMap};
use crate::config::{BuildDef, Catalog, ConfigError, Distro, TemplateInfo};
use crate::diagnostics::Diagnostics;
use crate::packer::PackerTemplate;
use crate::post_processors;
use crate::provisioners;
use crate::release::{ReleaseInfo, ReleaseResolver};

/// Which distro release a build targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub distro: String,
    pub arch: String,
    pub image: String,
    pub release: String,
}

impl Identity {
    /// Name used for distro builds that have no name of their own.
    pub fn default_build_name(&self) -> String {
        format!("{}-{}-{}-{}", self.distro, self.release, self.arch, self.image)
    }
}

/// External collaborators used while building targets.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub release: &'a dyn ReleaseResolver,
    pub lines: &'a dyn LineSource,
}

/// Everything needed to generate one build.
///
/// Created from application defaults layered with a distro's defaults,
/// then optionally derived into a named build. Deriving clones the whole
/// aggregate, so a distro template can seed any number of builds.
#[derive(Debug, Clone)]
pub struct RawTemplate {
    pub identity: Identity,
    pub base_url: String,
    /// Explicit build name; distro builds derive one from the identity.
    pub build_name: Option<String>,
    pub info: TemplateInfo,
    pub dirs: IoDirs,
    pub build: BuildSections,
    /// Generation date as `YYYY-MM-DD`, fixed at creation.
    pub date: String,
    pub delim: char,

    // Set by resolution.
    pub(crate) vars: VarBindings,
    pub(crate) name: String,
    pub(crate) resolved: Option<ResolvedDirs>,

    // Set while building targets.
    release: Option<ReleaseInfo>,
    script_names: Vec<String>,
}

impl RawTemplate {
    /// Layer a distro's defaults over the application defaults.
    pub fn for_distro(
        catalog: &Catalog,
        distro_name: &str,
        date: NaiveDate,
        delim: char,
    ) -> Result<Self, ConfigError> {
        let distro = catalog.distro(distro_name)?;
        let defaults = &catalog.defaults;

        let mut info = defaults.info.clone();
        info.update(&distro.info);
        let mut dirs = defaults.dirs.clone();
        dirs.update(&distro.dirs);
        let mut build = defaults.build.clone();
        build.update(&distro.build);

        let pick = |field: &'static str| -> Result<String, ConfigError> {
            distro
                .default_image
                .get(field)
                .map(str::to_string)
                .or_else(|| distro.supported(field).first().cloned())
                .ok_or_else(|| ConfigError::MissingSelection {
                    distro: distro_name.to_string(),
                    field,
                })
        };
        let identity = Identity {
            distro: distro_name.to_string(),
            arch: pick("arch")?,
            image: pick("image")?,
            release: pick("release")?,
        };

        Ok(Self {
            identity,
            base_url: distro.base_url.clone(),
            build_name: None,
            info,
            dirs,
            build,
            date: date.format("%Y-%m-%d").to_string(),
            delim,
            vars: VarBindings::new(delim),
            name: String::new(),
            resolved: None,
            release: None,
            script_names: Vec::new(),
        })
    }

    /// Override the arch, image or release selection.
    ///
    /// Each requested value must appear in the distro's supported list,
    /// when the distro declares one.
    pub fn select(
        &mut self,
        distro: &Distro,
        arch: Option<&str>,
        image: Option<&str>,
        release: Option<&str>,
    ) -> Result<(), ConfigError> {
        for (field, requested) in [("arch", arch), ("image", image), ("release", release)] {
            let Some(value) = requested.filter(|v| !v.is_empty()) else {
                continue;
            };
            let supported = distro.supported(field);
            if !supported.is_empty() && !supported.iter().any(|s| s == value) {
                return Err(ConfigError::UnsupportedSelection {
                    distro: self.identity.distro.clone(),
                    field,
                    value: value.to_string(),
                    supported: supported.to_vec(),
                });
            }
            let slot = match field {
                "arch" => &mut self.identity.arch,
                "image" => &mut self.identity.image,
                _ => &mut self.identity.release,
            };
            *slot = value.to_string();
        }
        Ok(())
    }

    /// A named build derived from this distro template.
    ///
    /// `self` is left untouched.
    pub fn derive(&self, name: &str, def: &BuildDef, distro: &Distro) -> Result<Self, ConfigError> {
        let mut derived = self.clone();
        derived.select(
            distro,
            def.arch.as_deref(),
            def.image.as_deref(),
            def.release.as_deref(),
        )?;
        if let Some(url) = def.base_url.as_deref().filter(|u| !u.is_empty()) {
            derived.base_url = url.to_string();
        }
        derived.info.update(&def.info);
        derived.dirs.update(&def.dirs);
        derived.build.update(&def.build);
        derived.build_name = Some(name.to_string());
        Ok(derived)
    }

    /// The build name: explicit, or derived from the identity.
    pub fn build_name(&self) -> String {
        self.build_name
            .clone()
            .unwrap_or_else(|| self.identity.default_build_name())
    }

    /// The resolved template name; empty until resolution has run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolved_dirs(&self) -> Option<&ResolvedDirs> {
        self.resolved.as_ref()
    }

    pub fn vars(&self) -> &VarBindings {
        &self.vars
    }

    /// Script names referenced by provisioners, in first-use order.
    pub fn script_names(&self) -> &[String] {
        &self.script_names
    }

    /// Release metadata, if a builder looked it up.
    pub fn release_info(&self) -> Option<&ReleaseInfo> {
        self.release.as_ref()
    }

    /// Resolve variables, then build every selected target in type-list order.
    ///
    /// The first failing target aborts the build.
    pub fn create_packer_template(
        &mut self,
        collab: Collaborators<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<PackerTemplate, TemplateError> {
        let dirs = self.resolve_vars()?;
        let build_name = self.build_name();
        if self.build.builder_types.is_empty() {
            return Err(TemplateError::NoBuilders(build_name));
        }
        tracing::debug!(build = %build_name, name = %self.name, "building targets");

        let mut ctx = ComponentContext {
            vars: &self.vars,
            identity: &self.identity,
            base_url: &self.base_url,
            dirs: &dirs,
            release_cache: &mut self.release,
            releases: collab.release,
            lines: collab.lines,
            diagnostics,
            scripts: &mut self.script_names,
        };

        let sections = &self.build;
        let common = sections.builders.get(COMMON);
        let builders = build_all(&sections.builder_types, &sections.builders, |kind, section| {
            builders::build(kind, section, common, &mut ctx)
        })?;
        let post_processors = build_all(
            &sections.post_processor_types,
            &sections.post_processors,
            |kind, section| post_processors::build(kind, section, &mut ctx),
        )?;
        let provisioners = build_all(
            &sections.provisioner_types,
            &sections.provisioners,
            |kind, section| provisioners::build(kind, section, &mut ctx),
        )?;

        Ok(PackerTemplate {
            description: self.info.description.clone().unwrap_or_default(),
            min_packer_version: self.info.min_packer_version.clone(),
            builders,
            post_processors,
            provisioners,
            variables: Default::default(),
        })
    }
}

fn build_all<F>(
    types: &[String],
    sections: &std::collections::BTreeMap<String, TemplateSection>,
    mut build: F,
) -> Result<Vec<SettingsMap>, ComponentError>
where
    F: FnMut(&str, Option<&TemplateSection>) -> Result<SettingsMap, ComponentError>,
{
    types
        .iter()
        .map(|kind| build(kind, sections.get(kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::CountingResolver;
    use crate::commands::FsLineSource;
    use serde_json::json;

    const DEFAULTS: &str = r#"
name = ":build_name"
description = "default template"
min_packer_version = "0.8.0"
out_dir = "out/:type/:build_name"

[build]
builder_types = ["virtualbox-iso", "vmware-iso"]
post_processor_types = ["vagrant"]

[build.builders.common]
settings = ["ssh_username=vagrant", "boot_wait=5s"]

[build.builders.virtualbox-iso]
settings = ["memory=1024"]

[build.builders.vmware-iso]
settings = ["disk_size=20000"]

[build.post_processors.vagrant]
settings = ["output=:out_dir/packer.box"]
"#;

    const SUPPORTED: &str = r#"
[ubuntu]
arch = ["amd64", "i386"]
image = ["server", "desktop"]
release = ["14.04", "16.04"]
default_image = ["arch=amd64", "image=server", "release=16.04"]
base_url = "http://releases.ubuntu.com/"

[ubuntu.build.builders.common]
settings = ["boot_wait=10s"]
"#;

    const BUILDS: &str = r#"
[web]
type = "ubuntu"
release = "14.04"

[web.build]
builder_types = ["virtualbox-iso"]

[web.build.builders.virtualbox-iso]
settings = ["memory=4096"]
"#;

    fn catalog() -> Catalog {
        Catalog::from_toml(DEFAULTS, SUPPORTED, Some(BUILDS), None).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, 1).unwrap()
    }

    #[test]
    fn test_for_distro_layers_defaults() {
        let catalog = catalog();
        let raw = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        assert_eq!(raw.identity.release, "16.04");
        assert_eq!(raw.build_name(), "ubuntu-16.04-amd64-server");
        assert_eq!(raw.date, "2016-04-01");
        assert_eq!(raw.build.builders[COMMON].settings.get("boot_wait"), Some("10s"));
        assert_eq!(raw.build.builder_types, vec!["virtualbox-iso", "vmware-iso"]);
    }

    #[test]
    fn test_select_rejects_unsupported_values() {
        let catalog = catalog();
        let distro = catalog.distro("ubuntu").unwrap();
        let mut raw = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        let err = raw.select(distro, Some("sparc"), None, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ubuntu: arch \"sparc\" not supported; expected one of: amd64, i386"
        );
        raw.select(distro, Some("i386"), None, Some("14.04")).unwrap();
        assert_eq!(raw.build_name(), "ubuntu-14.04-i386-server");
    }

    #[test]
    fn test_derive_does_not_mutate_distro_template() {
        let catalog = catalog();
        let distro = catalog.distro("ubuntu").unwrap();
        let base = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        let web = base
            .derive("web", catalog.build("web").unwrap(), distro)
            .unwrap();

        assert_eq!(web.build.builder_types, vec!["virtualbox-iso"]);
        assert_eq!(
            web.build.builders["virtualbox-iso"].settings.get("memory"),
            Some("4096")
        );
        assert_eq!(web.identity.release, "14.04");
        assert_eq!(web.build_name(), "web");

        assert_eq!(base.build.builder_types, vec!["virtualbox-iso", "vmware-iso"]);
        assert_eq!(
            base.build.builders["virtualbox-iso"].settings.get("memory"),
            Some("1024")
        );
        assert_eq!(base.identity.release, "16.04");
    }

    #[test]
    fn test_create_packer_template_builds_every_type() {
        let catalog = catalog();
        let mut raw = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        let resolver = CountingResolver::default();
        let collab = Collaborators {
            release: &resolver,
            lines: &FsLineSource,
        };
        let mut diagnostics = Diagnostics::new();
        let template = raw.create_packer_template(collab, &mut diagnostics).unwrap();

        assert_eq!(template.builders.len(), 2);
        assert_eq!(template.builders[0]["type"], "virtualbox-iso");
        assert_eq!(template.builders[0]["memory"], 1024);
        assert_eq!(template.builders[0]["boot_wait"], "10s");
        assert_eq!(template.builders[0]["guest_os_type"], "Ubuntu_64");
        assert_eq!(template.builders[1]["type"], "vmware-iso");
        assert_eq!(template.builders[1]["guest_os_type"], "ubuntu-64");
        assert_eq!(template.post_processors.len(), 1);
        assert_eq!(
            template.post_processors[0]["output"],
            json!("out/ubuntu/ubuntu-16.04-amd64-server/packer.box")
        );
        assert_eq!(resolver.calls.get(), 1);
        assert_eq!(raw.name(), "ubuntu-16.04-amd64-server");
    }

    #[test]
    fn test_no_builder_types_is_an_error() {
        let catalog = Catalog::from_toml("", SUPPORTED, None, None).unwrap();
        let mut raw = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        let resolver = CountingResolver::default();
        let err = raw
            .create_packer_template(
                Collaborators {
                    release: &resolver,
                    lines: &FsLineSource,
                },
                &mut Diagnostics::new(),
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ubuntu-16.04-amd64-server: no builder types selected"
        );
    }

    #[test]
    fn test_missing_builder_section_is_an_error() {
        let defaults = r#"
[build]
builder_types = ["qemu"]
"#;
        let catalog = Catalog::from_toml(defaults, SUPPORTED, None, None).unwrap();
        let mut raw = RawTemplate::for_distro(&catalog, "ubuntu", date(), ':').unwrap();
        let resolver = CountingResolver::default();
        let err = raw
            .create_packer_template(
                Collaborators {
                    release: &resolver,
                    lines: &FsLineSource,
                },
                &mut Diagnostics::new(),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "qemu: builder configuration not found");
    }
}
