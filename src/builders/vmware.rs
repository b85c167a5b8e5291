use super::vm::{self, VmState};
use super::BuilderKind;
use crate::communicator::Communicator;
use crate::component::{
    apply_arrays, apply_settings, merged_settings, Assembler, Component, ComponentContext,
    ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const ISO: Schema = Schema {
    strings: &[
        "boot_wait",
        "disk_type_id",
        "fusion_app_path",
        "guest_os_type",
        "http_directory",
        "iso_checksum",
        "iso_checksum_type",
        "iso_target_path",
        "iso_url",
        "output_directory",
        "remote_cache_datastore",
        "remote_cache_directory",
        "remote_datastore",
        "remote_host",
        "remote_password",
        "remote_private_key_file",
        "remote_type",
        "remote_username",
        "shutdown_command",
        "shutdown_timeout",
        "tools_upload_flavor",
        "tools_upload_path",
        "version",
        "vm_name",
        "vmdk_name",
        "vmx_template_path",
    ],
    ints: &[
        "disk_size",
        "http_port_max",
        "http_port_min",
        "vnc_port_max",
        "vnc_port_min",
    ],
    bools: &["headless", "skip_compaction"],
    arrays: &[
        "boot_command",
        "disk_additional_size",
        "floppy_files",
        "iso_urls",
        "vmx_data",
        "vmx_data_post",
    ],
    required: &["ssh_username"],
};

const VMX: Schema = Schema {
    strings: &[
        "boot_wait",
        "fusion_app_path",
        "http_directory",
        "output_directory",
        "shutdown_command",
        "shutdown_timeout",
        "source_path",
        "vm_name",
    ],
    ints: &["http_port_max", "http_port_min", "vnc_port_max", "vnc_port_min"],
    bools: &["headless", "skip_compaction"],
    arrays: &["boot_command", "floppy_files", "vmx_data", "vmx_data_post"],
    required: &["source_path", "ssh_username"],
};

pub(super) fn iso(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::VmwareIso, &ISO, section, common, ctx)
}

pub(super) fn vmx(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::VmwareVmx, &VMX, section, common, ctx)
}

fn build(
    kind: BuilderKind,
    schema: &Schema,
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let settings = merged_settings(section, common);
    let comm = Communicator::from_settings(kind.as_str(), &settings)?;
    let mut asm = Assembler::new(Component::Builder, kind.as_str(), schema);
    let mut state = VmState::default();

    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        if comm.store(asm, key, value, ctx)? {
            return Ok(true);
        }
        vm::setting(asm, key, value, ctx, &mut state)
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        vm::array(asm, name, value, ctx, &state)
    })?;

    if kind == BuilderKind::VmwareIso {
        vm::iso_media(&mut asm, ctx, kind)?;
    }
    vm::http_directory(&mut asm, ctx);
    comm.adjust_required(&mut asm);
    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::{list, section, Harness};
    use crate::release::ReleaseInfo;
    use serde_json::json;

    #[test]
    fn test_vmware_iso_uses_cached_release() {
        let mut h = Harness::new();
        h.cache = Some(ReleaseInfo {
            iso_url: "http://mirror/ubuntu.iso".to_string(),
            checksum: "abc".to_string(),
            checksum_type: "sha256".to_string(),
            os_type: "ubuntu-32".to_string(),
        });
        let out = {
            let mut ctx = h.ctx();
            iso(
                &section(
                    &["ssh_username=vagrant", "disk_size=40000"],
                    vec![
                        ("vmx_data", list(&["memsize=2048", "cpuid.coresPerSocket=1"])),
                        ("disk_additional_size", list(&["1000"])),
                    ],
                ),
                None,
                &mut ctx,
            )
            .unwrap()
        };
        assert_eq!(h.releases.calls.get(), 0);
        assert_eq!(out["iso_url"], "http://mirror/ubuntu.iso");
        assert_eq!(out["guest_os_type"], "ubuntu-32");
        assert_eq!(
            out["vmx_data"],
            json!({"memsize": "2048", "cpuid.coresPerSocket": "1"})
        );
        assert_eq!(out["disk_additional_size"], json!([1000]));
    }

    #[test]
    fn test_vmware_vmx() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let out = vmx(
            &section(
                &["ssh_username=vagrant", "source_path=base.vmx", "shutdown_command=halt"],
                vec![],
            ),
            None,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out["type"], "vmware-vmx");
        assert_eq!(out["shutdown_command"], "halt");
        assert!(out.get("guest_os_type").is_none());
    }

    #[test]
    fn test_winrm_builder() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let out = vmx(
            &section(
                &[
                    "communicator=winrm",
                    "winrm_username=Administrator",
                    "winrm_port=5985",
                    "source_path=win.vmx",
                ],
                vec![],
            ),
            None,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out["communicator"], "winrm");
        assert_eq!(out["winrm_port"], 5985);
    }
}
