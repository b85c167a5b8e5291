//! Post-processor kinds.
//!
//! Post-processors take their section's settings as is; there is no
//! common section. Every kind accepts `only` and `except` builder lists.

mod atlas;
mod docker;
mod vagrant;
mod vsphere;

use std::fmt;
use std::str::FromStr;

use crate::component::{
    apply_arrays, apply_settings, no_array_rules, no_setting_rules, Assembler, Component,
    ComponentContext, ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PostProcessorKind {
    Atlas,
    Compress,
    DockerImport,
    DockerPush,
    DockerSave,
    DockerTag,
    Vagrant,
    VagrantCloud,
    VSphere,
}

impl PostProcessorKind {
    pub const ALL: [PostProcessorKind; 9] = [
        PostProcessorKind::Atlas,
        PostProcessorKind::Compress,
        PostProcessorKind::DockerImport,
        PostProcessorKind::DockerPush,
        PostProcessorKind::DockerSave,
        PostProcessorKind::DockerTag,
        PostProcessorKind::Vagrant,
        PostProcessorKind::VagrantCloud,
        PostProcessorKind::VSphere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostProcessorKind::Atlas => "atlas",
            PostProcessorKind::Compress => "compress",
            PostProcessorKind::DockerImport => "docker-import",
            PostProcessorKind::DockerPush => "docker-push",
            PostProcessorKind::DockerSave => "docker-save",
            PostProcessorKind::DockerTag => "docker-tag",
            PostProcessorKind::Vagrant => "vagrant",
            PostProcessorKind::VagrantCloud => "vagrant-cloud",
            PostProcessorKind::VSphere => "vsphere",
        }
    }
}

impl fmt::Display for PostProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostProcessorKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        PostProcessorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ComponentError::Unsupported {
                kind: s.to_string(),
                component: Component::PostProcessor,
            })
    }
}

const COMPRESS: Schema = Schema {
    strings: &["output"],
    ints: &["compression_level"],
    bools: &["keep_input_artifact"],
    arrays: &["except", "only"],
    required: &[],
};

pub fn build(
    kind: &str,
    section: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let parsed: PostProcessorKind = kind.parse()?;
    let section = section.ok_or_else(|| ComponentError::MissingSection {
        kind: kind.to_string(),
        component: Component::PostProcessor,
    })?;
    tracing::debug!(kind = parsed.as_str(), "building post-processor");
    match parsed {
        PostProcessorKind::Atlas => atlas::build(section, ctx),
        PostProcessorKind::Compress => assemble(parsed, &COMPRESS, section, ctx),
        PostProcessorKind::DockerImport => assemble(parsed, &docker::IMPORT, section, ctx),
        PostProcessorKind::DockerPush => assemble(parsed, &docker::PUSH, section, ctx),
        PostProcessorKind::DockerSave => assemble(parsed, &docker::SAVE, section, ctx),
        PostProcessorKind::DockerTag => assemble(parsed, &docker::TAG, section, ctx),
        PostProcessorKind::Vagrant => assemble(parsed, &vagrant::VAGRANT, section, ctx),
        PostProcessorKind::VagrantCloud => assemble(parsed, &vagrant::CLOUD, section, ctx),
        PostProcessorKind::VSphere => vsphere::build(section, ctx),
    }
}

fn assemble(
    kind: PostProcessorKind,
    schema: &Schema,
    section: &TemplateSection,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let mut asm = Assembler::new(Component::PostProcessor, kind.as_str(), schema);
    apply_settings(&mut asm, &section.settings, ctx, no_setting_rules)?;
    apply_arrays(&mut asm, &section.arrays, ctx, no_array_rules)?;
    asm.finish()
}
