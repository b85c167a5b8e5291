use super::vm::{self, VmState};
use super::BuilderKind;
use crate::communicator::Communicator;
use crate::component::{
    apply_arrays, apply_settings, merged_settings, Assembler, Component, ComponentContext,
    ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const SCHEMA: Schema = Schema {
    strings: &[
        "accelerator",
        "boot_wait",
        "disk_cache",
        "disk_discard",
        "disk_interface",
        "format",
        "http_directory",
        "iso_checksum",
        "iso_checksum_type",
        "iso_target_path",
        "iso_url",
        "net_device",
        "output_directory",
        "qemu_binary",
        "shutdown_command",
        "shutdown_timeout",
        "vm_name",
    ],
    ints: &[
        "disk_size",
        "http_port_min",
        "http_port_max",
        "vnc_port_min",
        "vnc_port_max",
    ],
    bools: &["disk_compression", "disk_image", "headless", "skip_compaction"],
    arrays: &["boot_command", "floppy_files", "iso_urls", "qemuargs"],
    required: &["ssh_username"],
};

pub(super) fn build(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let kind = BuilderKind::Qemu;
    let settings = merged_settings(section, common);
    let comm = Communicator::from_settings(kind.as_str(), &settings)?;
    let mut asm = Assembler::new(Component::Builder, kind.as_str(), &SCHEMA);
    let mut state = VmState::default();

    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        if comm.store(asm, key, value, ctx)? {
            return Ok(true);
        }
        vm::setting(asm, key, value, ctx, &mut state)
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        if name == "qemuargs" {
            if let Some(items) = value.as_list() {
                asm.insert(name, super::split_rows(items, ctx));
                return Ok(true);
            }
        }
        vm::array(asm, name, value, ctx, &state)
    })?;

    vm::iso_media(&mut asm, ctx, kind)?;
    vm::http_directory(&mut asm, ctx);
    comm.adjust_required(&mut asm);
    asm.finish()
}
