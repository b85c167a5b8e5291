//! Provisioner kinds.
//!
//! Like post-processors, provisioners read their own section only. Every
//! kind accepts `only`, `except` and a per-builder `override` block.

mod agents;
mod shell;

use std::fmt;
use std::str::FromStr;

use crate::commands::{command_from_lines, is_command_file};
use crate::component::{
    apply_arrays, apply_settings, Assembler, Component, ComponentContext, ComponentError, Schema,
    SettingsMap,
};
use crate::template::TemplateSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProvisionerKind {
    Ansible,
    AnsibleLocal,
    ChefClient,
    ChefSolo,
    File,
    PuppetMasterless,
    PuppetServer,
    SaltMasterless,
    Shell,
    ShellLocal,
}

impl ProvisionerKind {
    pub const ALL: [ProvisionerKind; 10] = [
        ProvisionerKind::Ansible,
        ProvisionerKind::AnsibleLocal,
        ProvisionerKind::ChefClient,
        ProvisionerKind::ChefSolo,
        ProvisionerKind::File,
        ProvisionerKind::PuppetMasterless,
        ProvisionerKind::PuppetServer,
        ProvisionerKind::SaltMasterless,
        ProvisionerKind::Shell,
        ProvisionerKind::ShellLocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionerKind::Ansible => "ansible",
            ProvisionerKind::AnsibleLocal => "ansible-local",
            ProvisionerKind::ChefClient => "chef-client",
            ProvisionerKind::ChefSolo => "chef-solo",
            ProvisionerKind::File => "file",
            ProvisionerKind::PuppetMasterless => "puppet-masterless",
            ProvisionerKind::PuppetServer => "puppet-server",
            ProvisionerKind::SaltMasterless => "salt-masterless",
            ProvisionerKind::Shell => "shell",
            ProvisionerKind::ShellLocal => "shell-local",
        }
    }
}

impl fmt::Display for ProvisionerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvisionerKind {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ProvisionerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ComponentError::Unsupported {
                kind: s.to_string(),
                component: Component::Provisioner,
            })
    }
}

const FILE: Schema = Schema {
    strings: &["destination", "direction", "source"],
    ints: &[],
    bools: &[],
    arrays: &["except", "only", "override"],
    required: &["source", "destination"],
};

const SHELL_LOCAL: Schema = Schema {
    strings: &["command", "execute_command"],
    ints: &[],
    bools: &[],
    arrays: &["except", "only", "override"],
    required: &["command"],
};

pub fn build(
    kind: &str,
    section: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let parsed: ProvisionerKind = kind.parse()?;
    let section = section.ok_or_else(|| ComponentError::MissingSection {
        kind: kind.to_string(),
        component: Component::Provisioner,
    })?;
    tracing::debug!(kind = parsed.as_str(), "building provisioner");
    match parsed {
        ProvisionerKind::Ansible => assemble(parsed, &agents::ANSIBLE, section, ctx),
        ProvisionerKind::AnsibleLocal => assemble(parsed, &agents::ANSIBLE_LOCAL, section, ctx),
        ProvisionerKind::ChefClient => assemble(parsed, &agents::CHEF_CLIENT, section, ctx),
        ProvisionerKind::ChefSolo => assemble(parsed, &agents::CHEF_SOLO, section, ctx),
        ProvisionerKind::File => assemble(parsed, &FILE, section, ctx),
        ProvisionerKind::PuppetMasterless => {
            assemble(parsed, &agents::PUPPET_MASTERLESS, section, ctx)
        }
        ProvisionerKind::PuppetServer => assemble(parsed, &agents::PUPPET_SERVER, section, ctx),
        ProvisionerKind::SaltMasterless => {
            assemble(parsed, &agents::SALT_MASTERLESS, section, ctx)
        }
        ProvisionerKind::Shell => shell::build(section, ctx),
        ProvisionerKind::ShellLocal => assemble(parsed, &SHELL_LOCAL, section, ctx),
    }
}

fn assemble(
    kind: ProvisionerKind,
    schema: &Schema,
    section: &TemplateSection,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let mut asm = Assembler::new(Component::Provisioner, kind.as_str(), schema);
    apply_settings(&mut asm, &section.settings, ctx, command_setting)?;
    apply_arrays(&mut asm, &section.arrays, ctx, agents::object_array)?;
    asm.finish()
}

/// `execute_command` and `install_command` may name a command file, in
/// which case its first command is used. `sftp_command` takes the whole
/// file, joining lines that end in a backslash.
fn command_setting(
    asm: &mut Assembler<'_>,
    key: &str,
    value: &str,
    ctx: &mut ComponentContext<'_>,
) -> Result<bool, ComponentError> {
    let command_key = matches!(key, "execute_command" | "install_command" | "sftp_command");
    if !command_key || !asm.accepts(key) || !is_command_file(value) {
        return Ok(false);
    }
    let lines = ctx.read_commands(asm.kind(), key, value)?;
    let command = if key == "sftp_command" {
        command_from_lines(&lines)
    } else {
        lines.into_iter().next().unwrap_or_default()
    };
    asm.insert(key, command);
    Ok(true)
}
