use super::{object_array, BuilderKind};
use crate::communicator::Communicator;
use crate::component::{
    apply_arrays, apply_settings, merged_settings, Assembler, Component, ComponentContext,
    ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const SCHEMA: Schema = Schema {
    strings: &[
        "export_path",
        "image",
        "login_email",
        "login_password",
        "login_server",
        "login_username",
    ],
    ints: &[],
    bools: &["commit", "discard", "login", "pull"],
    arrays: &["run_command", "volumes"],
    required: &["image"],
};

/// Docker needs exactly one of `commit`, `discard` or `export_path`.
pub(super) fn build(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let kind = BuilderKind::Docker.as_str();
    let settings = merged_settings(section, common);
    let comm = Communicator::from_settings(kind, &settings)?;
    let mut asm = Assembler::new(Component::Builder, kind, &SCHEMA);

    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        comm.store(asm, key, value, ctx)
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        Ok(object_array(asm, name, value, ctx, &["volumes"]))
    })?;

    let committed = asm.get_bool("commit") || asm.get_bool("discard");
    if !committed && !asm.has("export_path") {
        return Err(asm.required_error("export_path"));
    }
    comm.adjust_required(&mut asm);
    asm.finish()
}
