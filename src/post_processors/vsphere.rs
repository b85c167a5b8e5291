use super::PostProcessorKind;
use crate::component::{
    apply_arrays, apply_settings, no_array_rules, no_setting_rules, Assembler, Component,
    ComponentContext, ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const SCHEMA: Schema = Schema {
    strings: &[
        "cluster",
        "datacenter",
        "datastore",
        "disk_mode",
        "host",
        "password",
        "resource_pool",
        "username",
        "vm_folder",
        "vm_name",
        "vm_network",
    ],
    ints: &[],
    bools: &["insecure", "keep_input_artifact"],
    arrays: &["except", "only"],
    required: &["cluster", "datacenter", "host", "password", "username", "vm_name"],
};

/// Upload needs a datastore or a resource pool to land in.
pub(super) fn build(
    section: &TemplateSection,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let mut asm = Assembler::new(
        Component::PostProcessor,
        PostProcessorKind::VSphere.as_str(),
        &SCHEMA,
    );
    apply_settings(&mut asm, &section.settings, ctx, no_setting_rules)?;
    apply_arrays(&mut asm, &section.arrays, ctx, no_array_rules)?;
    if !asm.has("datastore") && !asm.has("resource_pool") {
        return Err(asm.required_error("datastore/resource_pool"));
    }
    asm.finish()
}
