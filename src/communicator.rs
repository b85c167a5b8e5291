//! Builder communicators.
//!
//! A builder's `communicator` setting selects how the build talks to the
//! machine: `ssh` (the default), `winrm`, or `none`. Only the selected
//! communicator's `ssh_*` or `winrm_*` keys are carried into the output.

use packstead_settings::Settings;

use crate::component::{Assembler, ComponentContext, ComponentError};

const SSH_STRINGS: &[&str] = &[
    "ssh_host",
    "ssh_username",
    "ssh_password",
    "ssh_private_key_file",
    "ssh_timeout",
    "ssh_wait_timeout",
    "ssh_bastion_host",
    "ssh_bastion_username",
    "ssh_bastion_password",
    "ssh_bastion_private_key_file",
];
const SSH_INTS: &[&str] = &[
    "ssh_port",
    "ssh_handshake_attempts",
    "ssh_bastion_port",
    "ssh_host_port_min",
    "ssh_host_port_max",
];
const SSH_BOOLS: &[&str] = &["ssh_pty", "ssh_disable_agent", "ssh_skip_nat_mapping"];

const WINRM_STRINGS: &[&str] = &["winrm_host", "winrm_username", "winrm_password", "winrm_timeout"];
const WINRM_INTS: &[&str] = &["winrm_port"];
const WINRM_BOOLS: &[&str] = &["winrm_use_ssl", "winrm_insecure"];

/// How a builder reaches the machine it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Communicator {
    None,
    #[default]
    Ssh,
    WinRm,
}

impl Communicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Communicator::None => "none",
            Communicator::Ssh => "ssh",
            Communicator::WinRm => "winrm",
        }
    }

    /// Read the `communicator` setting of a merged builder section.
    pub fn from_settings(kind: &str, settings: &Settings) -> Result<Self, ComponentError> {
        let Some(value) = settings.get("communicator") else {
            return Ok(Communicator::Ssh);
        };
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(Communicator::None),
            "ssh" => Ok(Communicator::Ssh),
            "winrm" => Ok(Communicator::WinRm),
            _ => Err(ComponentError::InvalidCommunicator {
                kind: kind.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Store `key` if it belongs to communicator configuration.
    ///
    /// Returns false for keys that are not communicator keys at all.
    /// Keys of an unselected communicator are consumed and reported.
    pub fn store(
        &self,
        asm: &mut Assembler<'_>,
        key: &str,
        value: &str,
        ctx: &mut ComponentContext<'_>,
    ) -> Result<bool, ComponentError> {
        if key == "communicator" {
            asm.insert(key, self.as_str());
            return Ok(true);
        }
        if asm.accepts(key) {
            return Ok(false);
        }
        let (strings, ints, bools, owner) = if key.starts_with("ssh_") {
            (SSH_STRINGS, SSH_INTS, SSH_BOOLS, Communicator::Ssh)
        } else if key.starts_with("winrm_") {
            (WINRM_STRINGS, WINRM_INTS, WINRM_BOOLS, Communicator::WinRm)
        } else {
            return Ok(false);
        };
        if owner != *self {
            ctx.diagnostics.warn(
                asm.kind(),
                Some(key),
                format!("ignored: communicator is {}", self.as_str()),
            );
            return Ok(true);
        }
        if strings.contains(&key) {
            asm.store_string(key, value);
        } else if ints.contains(&key) {
            asm.store_int(key, value)?;
        } else if bools.contains(&key) {
            asm.store_bool(key, value);
        } else {
            ctx.diagnostics.unknown_setting(asm.kind(), key);
        }
        Ok(true)
    }

    /// Adjust required keys for the selected communicator.
    pub fn adjust_required(&self, asm: &mut Assembler<'_>) {
        match self {
            Communicator::Ssh => {}
            Communicator::WinRm => {
                asm.substitute_required("ssh_username", Some("winrm_username"));
            }
            Communicator::None => {
                asm.substitute_required("ssh_username", None);
            }
        }
    }
}
