//! Rules shared by the local VM builders (qemu, VirtualBox, VMware).

use serde_json::Value;

use packstead_settings::{parse_setting, ArrayValue};

use super::{object_array, BuilderKind};
use crate::commands::is_command_file;
use crate::component::{Assembler, ComponentContext, ComponentError};
use crate::release::DEFAULT_CHECKSUM_TYPE;

/// What the settings pass saw that the arrays pass needs to know.
#[derive(Debug, Default)]
pub(super) struct VmState {
    boot_command_from_file: bool,
}

/// Handle the command settings.
pub(super) fn setting(
    asm: &mut Assembler<'_>,
    key: &str,
    value: &str,
    ctx: &mut ComponentContext<'_>,
    state: &mut VmState,
) -> Result<bool, ComponentError> {
    match key {
        "boot_command" if asm.accepts_array(key) => {
            if is_command_file(value) {
                let lines = ctx.read_commands(asm.kind(), key, value)?;
                asm.insert(key, lines);
                state.boot_command_from_file = true;
            } else {
                ctx.diagnostics.warn(
                    asm.kind(),
                    Some(key),
                    "boot_command setting must name a command file; use the boot_command array",
                );
            }
            Ok(true)
        }
        "shutdown_command" if asm.accepts(key) => {
            if is_command_file(value) {
                let first = ctx
                    .read_commands(asm.kind(), key, value)?
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                asm.insert(key, first);
            } else {
                asm.insert(key, value);
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Handle the arrays with VM-specific shapes.
pub(super) fn array(
    asm: &mut Assembler<'_>,
    name: &str,
    value: &ArrayValue,
    ctx: &mut ComponentContext<'_>,
    state: &VmState,
) -> Result<bool, ComponentError> {
    if !asm.accepts_array(name) {
        return Ok(false);
    }
    match name {
        "boot_command" if state.boot_command_from_file => {
            ctx.diagnostics.warn(
                asm.kind(),
                Some(name),
                "boot_command array ignored: a command file was given",
            );
            Ok(true)
        }
        "vboxmanage" | "vboxmanage_post" => {
            match value.as_list() {
                Some(items) => {
                    let rows = vboxmanage_rows(asm.kind(), name, items, ctx);
                    asm.insert(name, rows);
                }
                None => ctx
                    .diagnostics
                    .warn(asm.kind(), Some(name), "expected a list of key=value entries"),
            }
            Ok(true)
        }
        "disk_additional_size" => {
            let Some(items) = value.as_list() else {
                return Ok(false);
            };
            let mut sizes = Vec::with_capacity(items.len());
            for item in items {
                let resolved = ctx.resolve(item);
                let size = resolved
                    .trim()
                    .parse::<i64>()
                    .map_err(|source| ComponentError::InvalidInt {
                        kind: asm.kind().to_string(),
                        key: name.to_string(),
                        value: resolved.clone(),
                        source,
                    })?;
                sizes.push(Value::from(size));
            }
            asm.insert(name, Value::Array(sizes));
            Ok(true)
        }
        _ => Ok(object_array(asm, name, value, ctx, &["vmx_data", "vmx_data_post"])),
    }
}

/// `key=value` entries as `["modifyvm", "{{.Name}}", "--key", "value"]` rows.
fn vboxmanage_rows(
    kind: &str,
    name: &str,
    items: &[String],
    ctx: &mut ComponentContext<'_>,
) -> Value {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let pair = match parse_setting(item) {
            Ok(pair) => pair,
            Err(e) => {
                ctx.diagnostics.warn(kind, Some(name), e.to_string());
                continue;
            }
        };
        let flag = if pair.key.starts_with("--") {
            pair.key
        } else {
            format!("--{}", pair.key)
        };
        rows.push(Value::Array(vec![
            Value::from("modifyvm"),
            Value::from("{{.Name}}"),
            Value::from(flag),
            Value::from(ctx.resolve(&pair.value)),
        ]));
    }
    Value::Array(rows)
}

/// Apply the ISO media rule and fill in `guest_os_type`.
///
/// An explicit `iso_url` (or `iso_urls`) needs its checksum and checksum
/// type; otherwise the release metadata supplies all three.
pub(super) fn iso_media(
    asm: &mut Assembler<'_>,
    ctx: &mut ComponentContext<'_>,
    kind: BuilderKind,
) -> Result<(), ComponentError> {
    if asm.has("iso_url") && asm.has("iso_urls") {
        asm.remove("iso_urls");
        ctx.diagnostics
            .warn(asm.kind(), Some("iso_urls"), "ignored: iso_url is set");
    }
    if asm.has("iso_url") || asm.has("iso_urls") {
        asm.require("iso_checksum")?;
        asm.require("iso_checksum_type")?;
    } else {
        let checksum_type = asm
            .get_str("iso_checksum_type")
            .unwrap_or(DEFAULT_CHECKSUM_TYPE)
            .to_string();
        let info = ctx.release_info(asm.kind(), &checksum_type)?;
        asm.insert("iso_url", info.iso_url);
        asm.insert("iso_checksum", info.checksum);
        asm.insert("iso_checksum_type", info.checksum_type);
    }
    guest_os_type(asm, ctx, kind);
    Ok(())
}

/// Fill `guest_os_type` from release metadata when it is unset.
pub(super) fn guest_os_type(asm: &mut Assembler<'_>, ctx: &ComponentContext<'_>, kind: BuilderKind) {
    if !asm.accepts("guest_os_type") || asm.has("guest_os_type") {
        return;
    }
    if let Some(os_type) = ctx.cached_release().and_then(|info| info.guest_os_type(kind)) {
        asm.insert("guest_os_type", os_type);
    }
}

/// Default `http_directory` to the build's http directory.
pub(super) fn http_directory(asm: &mut Assembler<'_>, ctx: &ComponentContext<'_>) {
    if asm.accepts("http_directory") && !asm.has("http_directory") {
        asm.insert("http_directory", ctx.dirs.http_dir.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::{list, Harness};
    use crate::component::{Component, Schema};
    use serde_json::json;

    const SCHEMA: Schema = Schema {
        strings: &[
            "guest_os_type",
            "http_directory",
            "iso_checksum",
            "iso_checksum_type",
            "iso_url",
            "shutdown_command",
        ],
        arrays: &["boot_command", "iso_urls", "vboxmanage", "vmx_data", "disk_additional_size"],
        ..Schema::EMPTY
    };

    #[test]
    fn test_vboxmanage_rows() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let mut asm = Assembler::new(Component::Builder, "virtualbox-iso", &SCHEMA);
        let value = list(&["memory=:name", "--cpus=2"]);
        assert!(array(&mut asm, "vboxmanage", &value, &mut ctx, &VmState::default()).unwrap());
        assert_eq!(
            asm.finish().unwrap()["vboxmanage"],
            json!([
                ["modifyvm", "{{.Name}}", "--memory", "ubuntu-16.04-amd64-server"],
                ["modifyvm", "{{.Name}}", "--cpus", "2"]
            ])
        );
    }

    #[test]
    fn test_vmx_data_object() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let mut asm = Assembler::new(Component::Builder, "vmware-iso", &SCHEMA);
        let value = list(&["memsize=1024", "numvcpus=2"]);
        array(&mut asm, "vmx_data", &value, &mut ctx, &VmState::default()).unwrap();
        assert_eq!(
            asm.finish().unwrap()["vmx_data"],
            json!({"memsize": "1024", "numvcpus": "2"})
        );
    }

    #[test]
    fn test_boot_command_file_beats_array() {
        let mut h = Harness::new().with_command_file("boot.command", &["<esc><wait>", "<enter>"]);
        {
            let mut ctx = h.ctx();
            let mut asm = Assembler::new(Component::Builder, "qemu", &SCHEMA);
            let mut state = VmState::default();
            assert!(setting(&mut asm, "boot_command", "boot.command", &mut ctx, &mut state).unwrap());
            assert!(array(&mut asm, "boot_command", &list(&["<tab>"]), &mut ctx, &state).unwrap());
            assert_eq!(
                asm.finish().unwrap()["boot_command"],
                json!(["<esc><wait>", "<enter>"])
            );
        }
        assert!(h.diagnostics.mentions("qemu", "boot_command"));
    }

    #[test]
    fn test_shutdown_command_takes_first_line() {
        let mut h = Harness::new().with_command_file("shutdown.command", &["shutdown -P now", "exit"]);
        let mut ctx = h.ctx();
        let mut asm = Assembler::new(Component::Builder, "qemu", &SCHEMA);
        let mut state = VmState::default();
        setting(&mut asm, "shutdown_command", "shutdown.command", &mut ctx, &mut state).unwrap();
        assert_eq!(asm.get_str("shutdown_command"), Some("shutdown -P now"));
        setting(&mut asm, "shutdown_command", "poweroff", &mut ctx, &mut state).unwrap();
        assert_eq!(asm.get_str("shutdown_command"), Some("poweroff"));
    }

    #[test]
    fn test_disk_additional_size_ints() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let mut asm = Assembler::new(Component::Builder, "vmware-iso", &SCHEMA);
        let state = VmState::default();
        array(&mut asm, "disk_additional_size", &list(&["1024", "2048"]), &mut ctx, &state).unwrap();
        assert_eq!(asm.get_str("type"), Some("vmware-iso"));
        let err = array(&mut asm, "disk_additional_size", &list(&["lots"]), &mut ctx, &state)
            .unwrap_err();
        assert!(err.to_string().starts_with("vmware-iso: disk_additional_size=lots"));
    }

    #[test]
    fn test_iso_lookup_fills_media_and_guest_os() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let mut asm = Assembler::new(Component::Builder, "virtualbox-iso", &SCHEMA);
            iso_media(&mut asm, &mut ctx, BuilderKind::VirtualBoxIso).unwrap();
            let out = asm.finish().unwrap();
            assert_eq!(
                out["iso_url"],
                "http://releases.ubuntu.com/16.04/ubuntu-16.04-server-amd64.iso"
            );
            assert_eq!(out["iso_checksum"], "c0ffee");
            assert_eq!(out["iso_checksum_type"], "sha256");
            assert_eq!(out["guest_os_type"], "Ubuntu_64");
        }
        assert_eq!(h.releases.calls.get(), 1);
    }

    #[test]
    fn test_explicit_iso_url_needs_checksum() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let mut asm = Assembler::new(Component::Builder, "qemu", &SCHEMA);
            asm.insert("iso_url", "http://mirror/x.iso");
            asm.insert("iso_checksum_type", "md5");
            let err = iso_media(&mut asm, &mut ctx, BuilderKind::Qemu).unwrap_err();
            assert_eq!(err.to_string(), "qemu: iso_checksum: required setting not found");
        }
        assert_eq!(h.releases.calls.get(), 0);
    }

    #[test]
    fn test_iso_url_beats_iso_urls() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let mut asm = Assembler::new(Component::Builder, "qemu", &SCHEMA);
            asm.insert("iso_url", "http://mirror/x.iso");
            asm.insert("iso_urls", json!(["http://a/x.iso"]));
            asm.insert("iso_checksum", "abc");
            asm.insert("iso_checksum_type", "md5");
            iso_media(&mut asm, &mut ctx, BuilderKind::Qemu).unwrap();
            assert!(!asm.has("iso_urls"));
            // no lookup, so no guest os type either
            assert!(!asm.has("guest_os_type"));
        }
        assert!(h.diagnostics.mentions("qemu", "iso_urls"));
    }

    #[test]
    fn test_http_directory_default() {
        let mut h = Harness::new();
        let ctx = h.ctx();
        let mut asm = Assembler::new(Component::Builder, "qemu", &SCHEMA);
        http_directory(&mut asm, &ctx);
        assert_eq!(asm.get_str("http_directory"), Some("http"));
    }
}
