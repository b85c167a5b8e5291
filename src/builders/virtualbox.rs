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
        "format",
        "guest_additions_mode",
        "guest_additions_path",
        "guest_additions_sha256",
        "guest_additions_url",
        "guest_os_type",
        "hard_drive_interface",
        "http_directory",
        "iso_checksum",
        "iso_checksum_type",
        "iso_interface",
        "iso_target_path",
        "iso_url",
        "output_directory",
        "shutdown_command",
        "shutdown_timeout",
        "virtualbox_version_file",
        "vm_name",
    ],
    ints: &["cpus", "disk_size", "http_port_min", "http_port_max", "memory"],
    bools: &["headless"],
    arrays: &[
        "boot_command",
        "export_opts",
        "floppy_files",
        "iso_urls",
        "vboxmanage",
        "vboxmanage_post",
    ],
    required: &["ssh_username"],
};

const OVF: Schema = Schema {
    strings: &[
        "boot_wait",
        "format",
        "guest_additions_mode",
        "guest_additions_path",
        "guest_additions_sha256",
        "guest_additions_url",
        "http_directory",
        "import_opts",
        "output_directory",
        "shutdown_command",
        "shutdown_timeout",
        "source_path",
        "virtualbox_version_file",
        "vm_name",
    ],
    ints: &["http_port_min", "http_port_max"],
    bools: &["headless"],
    arrays: &[
        "boot_command",
        "export_opts",
        "floppy_files",
        "import_flags",
        "vboxmanage",
        "vboxmanage_post",
    ],
    required: &["source_path", "ssh_username"],
};

pub(super) fn iso(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::VirtualBoxIso, &ISO, section, common, ctx)
}

pub(super) fn ovf(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::VirtualBoxOvf, &OVF, section, common, ctx)
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

    if kind == BuilderKind::VirtualBoxIso {
        vm::iso_media(&mut asm, ctx, kind)?;
    }
    vm::http_directory(&mut asm, ctx);
    comm.adjust_required(&mut asm);
    asm.finish()
}
