//! Builder kinds.
//!
//! Each kind turns its merged section into the settings map Packer
//! expects for that builder. The `common` section's settings are merged
//! under every kind's own settings first.

mod amazon;
mod cloud;
mod docker;
mod qemu;
mod virtualbox;
mod vm;
mod vmware;

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use packstead_settings::ArrayValue;

use crate::communicator::Communicator;
use crate::component::{
    apply_arrays, apply_settings, merged_settings, no_array_rules, pairs_to_object, Assembler, Component,
    ComponentContext, ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

/// The builder kinds templates can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuilderKind {
    AmazonChroot,
    AmazonEbs,
    AmazonInstance,
    DigitalOcean,
    Docker,
    GoogleCompute,
    Null,
    OpenStack,
    Qemu,
    VirtualBoxIso,
    VirtualBoxOvf,
    VmwareIso,
    VmwareVmx,
}

impl BuilderKind {
    pub const ALL: [BuilderKind; 13] = [
        BuilderKind::AmazonChroot,
        BuilderKind::AmazonEbs,
        BuilderKind::AmazonInstance,
        BuilderKind::DigitalOcean,
        BuilderKind::Docker,
        BuilderKind::GoogleCompute,
        BuilderKind::Null,
        BuilderKind::OpenStack,
        BuilderKind::Qemu,
        BuilderKind::VirtualBoxIso,
        BuilderKind::VirtualBoxOvf,
        BuilderKind::VmwareIso,
        BuilderKind::VmwareVmx,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::AmazonChroot => "amazon-chroot",
            BuilderKind::AmazonEbs => "amazon-ebs",
            BuilderKind::AmazonInstance => "amazon-instance",
            BuilderKind::DigitalOcean => "digitalocean",
            BuilderKind::Docker => "docker",
            BuilderKind::GoogleCompute => "googlecompute",
            BuilderKind::Null => "null",
            BuilderKind::OpenStack => "openstack",
            BuilderKind::Qemu => "qemu",
            BuilderKind::VirtualBoxIso => "virtualbox-iso",
            BuilderKind::VirtualBoxOvf => "virtualbox-ovf",
            BuilderKind::VmwareIso => "vmware-iso",
            BuilderKind::VmwareVmx => "vmware-vmx",
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuilderKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        BuilderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ComponentError::Unsupported {
                kind: s.to_string(),
                component: Component::Builder,
            })
    }
}

/// Build the settings map for builder `kind`.
///
/// `common` is the reserved common section, if the template has one.
pub fn build(
    kind: &str,
    section: Option<&TemplateSection>,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let parsed: BuilderKind = kind.parse()?;
    let section = section.ok_or_else(|| ComponentError::MissingSection {
        kind: kind.to_string(),
        component: Component::Builder,
    })?;
    tracing::debug!(kind = parsed.as_str(), "building builder");
    match parsed {
        BuilderKind::AmazonChroot => amazon::chroot(section, common, ctx),
        BuilderKind::AmazonEbs => amazon::ebs(section, common, ctx),
        BuilderKind::AmazonInstance => amazon::instance(section, common, ctx),
        BuilderKind::DigitalOcean => cloud::digitalocean(section, common, ctx),
        BuilderKind::Docker => docker::build(section, common, ctx),
        BuilderKind::GoogleCompute => cloud::googlecompute(section, common, ctx),
        BuilderKind::Null => null(section, common, ctx),
        BuilderKind::OpenStack => cloud::openstack(section, common, ctx),
        BuilderKind::Qemu => qemu::build(section, common, ctx),
        BuilderKind::VirtualBoxIso => virtualbox::iso(section, common, ctx),
        BuilderKind::VirtualBoxOvf => virtualbox::ovf(section, common, ctx),
        BuilderKind::VmwareIso => vmware::iso(section, common, ctx),
        BuilderKind::VmwareVmx => vmware::vmx(section, common, ctx),
    }
}

/// Store `value` as an object if `name` is one of `object_arrays`.
///
/// Returns false when the array is not an object array.
fn object_array(
    asm: &mut Assembler<'_>,
    name: &str,
    value: &ArrayValue,
    ctx: &mut ComponentContext<'_>,
    object_arrays: &[&str],
) -> bool {
    if !object_arrays.contains(&name) || !asm.accepts_array(name) {
        return false;
    }
    match value.as_list() {
        Some(items) => {
            let object = pairs_to_object(asm.kind(), name, items, ctx);
            asm.insert(name, object);
        }
        None => ctx
            .diagnostics
            .warn(asm.kind(), Some(name), "expected a list of key=value entries"),
    }
    true
}

/// Settings, communicator and arrays for kinds without special rules.
fn standard(
    kind: BuilderKind,
    schema: &Schema,
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
    object_arrays: &[&str],
) -> Result<SettingsMap, ComponentError> {
    let settings = merged_settings(section, common);
    let comm = Communicator::from_settings(kind.as_str(), &settings)?;
    let mut asm = Assembler::new(Component::Builder, kind.as_str(), schema);
    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        comm.store(asm, key, value, ctx)
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        Ok(object_array(asm, name, value, ctx, object_arrays))
    })?;
    comm.adjust_required(&mut asm);
    asm.finish()
}

const NULL: Schema = Schema::EMPTY;

/// The null builder only sets up a communicator, so it must have one.
fn null(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let kind = BuilderKind::Null.as_str();
    let settings = merged_settings(section, common);
    let comm = Communicator::from_settings(kind, &settings)?;
    if comm == Communicator::None {
        return Err(ComponentError::InvalidCommunicator {
            kind: kind.to_string(),
            value: comm.as_str().to_string(),
        });
    }
    let mut asm = Assembler::new(Component::Builder, kind, &NULL);
    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        comm.store(asm, key, value, ctx)
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, no_array_rules)?;
    let host = match comm {
        Communicator::WinRm => "winrm_host",
        _ => "ssh_host",
    };
    asm.require(host)?;
    asm.require(&format!("{}_username", comm.as_str()))?;
    asm.finish()
}

/// `["a b c", ...]` as `[["a", "b", "c"], ...]`.
fn split_rows(items: &[String], ctx: &ComponentContext<'_>) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| {
                Value::Array(
                    ctx.resolve(item)
                        .split_whitespace()
                        .map(|s| Value::String(s.to_string()))
                        .collect(),
                )
            })
            .collect(),
    )
}
