use super::PostProcessorKind;
use crate::component::{
    apply_arrays, apply_settings, no_setting_rules, pairs_to_object, Assembler, Component,
    ComponentContext, ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const SCHEMA: Schema = Schema {
    strings: &["artifact", "artifact_type", "atlas_url", "token"],
    ints: &[],
    bools: &[],
    arrays: &["except", "metadata", "only"],
    required: &["artifact", "artifact_type", "token"],
};

/// `metadata` is written as `key=value` items and uploaded as an object.
pub(super) fn build(
    section: &TemplateSection,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let mut asm = Assembler::new(
        Component::PostProcessor,
        PostProcessorKind::Atlas.as_str(),
        &SCHEMA,
    );
    apply_settings(&mut asm, &section.settings, ctx, no_setting_rules)?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        if name != "metadata" {
            return Ok(false);
        }
        match value.as_list() {
            Some(items) => {
                let object = pairs_to_object(asm.kind(), name, items, ctx);
                asm.insert(name, object);
            }
            None => ctx
                .diagnostics
                .warn(asm.kind(), Some(name), "expected a list of key=value items"),
        }
        Ok(true)
    })?;
    asm.finish()
}
