use super::{command_setting, ProvisionerKind};
use crate::component::{
    apply_arrays, apply_settings, array_to_json, Assembler, Component, ComponentContext,
    ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const SCHEMA: Schema = Schema {
    strings: &[
        "execute_command",
        "inline_shebang",
        "remote_file",
        "remote_folder",
        "remote_path",
        "start_retry_timeout",
    ],
    ints: &[],
    bools: &["binary", "skip_clean"],
    arrays: &["environment_vars", "except", "inline", "only", "override", "scripts"],
    required: &[],
};

/// Where the shell provisioner's commands come from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Inline,
    Script,
    Scripts,
}

/// Build the shell provisioner.
///
/// Only one of `inline`, `script` and `scripts` is emitted: an `inline`
/// array wins over a `script` setting, which wins over a `scripts`
/// array. The losers are reported. Script names are resolved against
/// the scripts directory and recorded for copying.
pub(super) fn build(
    section: &TemplateSection,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    let kind = ProvisionerKind::Shell.as_str();
    let mut asm = Assembler::new(Component::Provisioner, kind, &SCHEMA);

    let mut script = None;
    apply_settings(&mut asm, &section.settings, ctx, |asm, key, value, ctx| {
        if key == "script" {
            script = Some(value.to_string());
            return Ok(true);
        }
        command_setting(asm, key, value, ctx)
    })?;

    let source = if section.arrays.contains("inline") {
        Source::Inline
    } else if script.is_some() {
        Source::Script
    } else if section.arrays.contains("scripts") {
        Source::Scripts
    } else {
        return Err(asm.required_error("inline, script, scripts"));
    };

    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| match name {
        "inline" => Ok(false),
        "scripts" if source != Source::Scripts => {
            ctx.diagnostics
                .warn(asm.kind(), Some(name), shadowed_message(source));
            Ok(true)
        }
        "scripts" => {
            match value.as_list() {
                Some(items) => {
                    let paths: Vec<String> = items
                        .iter()
                        .map(|item| {
                            let resolved = ctx.resolve(item);
                            ctx.script_path(&resolved)
                        })
                        .collect();
                    asm.insert(name, paths);
                }
                None => ctx
                    .diagnostics
                    .warn(asm.kind(), Some(name), "expected a list of script names"),
            }
            Ok(true)
        }
        "override" => {
            let json = array_to_json(asm.kind(), value, ctx, &mut script_item);
            asm.insert(name, json);
            Ok(true)
        }
        _ => Ok(false),
    })?;

    if let Some(script) = script {
        if source == Source::Script {
            let path = ctx.script_path(&script);
            asm.insert("script", path);
        } else {
            ctx.diagnostics
                .warn(kind, Some("script"), shadowed_message(source));
        }
    }
    asm.finish()
}

fn shadowed_message(winner: Source) -> &'static str {
    match winner {
        Source::Inline => "ignored: inline commands take precedence",
        Source::Script | Source::Scripts => "ignored: script setting takes precedence",
    }
}

/// Script names inside override blocks get the same path treatment.
fn script_item(name: &str, item: String, ctx: &mut ComponentContext<'_>) -> String {
    match name {
        "script" | "scripts" => ctx.script_path(&item),
        _ => item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::{list, overrides, section, Harness};
    use serde_json::json;

    #[test]
    fn test_inline_wins() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let out = build(
                &section(
                    &["script=base.sh"],
                    vec![
                        ("inline", list(&["apt-get update", "echo :name"])),
                        ("scripts", list(&["a.sh", "b.sh"])),
                    ],
                ),
                &mut ctx,
            )
            .unwrap();
            assert_eq!(out["inline"], json!(["apt-get update", "echo ubuntu-16.04-amd64-server"]));
            assert!(out.get("script").is_none());
            assert!(out.get("scripts").is_none());
        }
        assert!(h.scripts.is_empty());
        assert!(h.diagnostics.mentions("shell", "script"));
        assert!(h.diagnostics.mentions("shell", "scripts"));
    }

    #[test]
    fn test_script_beats_scripts() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let out = build(
                &section(&["script=base.sh"], vec![("scripts", list(&["a.sh"]))]),
                &mut ctx,
            )
            .unwrap();
            assert_eq!(out["script"], "scripts/base.sh");
            assert!(out.get("scripts").is_none());
        }
        assert_eq!(h.scripts, vec!["base.sh"]);
    }

    #[test]
    fn test_scripts_resolved_and_recorded() {
        let mut h = Harness::new().with_command_file("execute.command", &[
            "echo 'vagrant' | {{ .Vars }} sudo -E -S sh '{{ .Path }}'",
        ]);
        {
            let mut ctx = h.ctx();
            let out = build(
                &section(
                    &["execute_command=execute.command", "binary=false"],
                    vec![
                        ("scripts", list(&["setup.sh", "vagrant.sh", "/opt/cleanup.sh"])),
                        ("environment_vars", list(&["BUILD=:name"])),
                    ],
                ),
                &mut ctx,
            )
            .unwrap();
            assert_eq!(
                out["scripts"],
                json!(["scripts/setup.sh", "scripts/vagrant.sh", "/opt/cleanup.sh"])
            );
            assert_eq!(
                out["execute_command"],
                "echo 'vagrant' | {{ .Vars }} sudo -E -S sh '{{ .Path }}'"
            );
            assert_eq!(out["environment_vars"], json!(["BUILD=ubuntu-16.04-amd64-server"]));
            assert_eq!(out["binary"], false);
        }
        assert_eq!(h.scripts, vec!["setup.sh", "vagrant.sh", "/opt/cleanup.sh"]);
    }

    #[test]
    fn test_no_source_is_an_error() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let err = build(&section(&["binary=true"], vec![]), &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shell: inline, script, scripts: required setting not found"
        );
    }

    #[test]
    fn test_override_scripts_use_scripts_dir() {
        let mut h = Harness::new();
        {
            let mut ctx = h.ctx();
            let out = build(
                &section(
                    &[],
                    vec![
                        ("scripts", list(&["base.sh"])),
                        (
                            "override",
                            overrides(vec![(
                                "virtualbox-iso",
                                vec![
                                    ("scripts", list(&["vbox-guest.sh"])),
                                    ("settings", list(&["execute_command=sudo sh"])),
                                ],
                            )]),
                        ),
                    ],
                ),
                &mut ctx,
            )
            .unwrap();
            assert_eq!(
                out["override"],
                json!({
                    "virtualbox-iso": {
                        "scripts": ["scripts/vbox-guest.sh"],
                        "execute_command": "sudo sh"
                    }
                })
            );
        }
        // arrays are visited by name, so `override` comes before `scripts`
        assert_eq!(h.scripts, vec!["vbox-guest.sh", "base.sh"]);
    }

    #[test]
    fn test_missing_command_file() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let err = build(
            &section(&["execute_command=missing.command"], vec![("inline", list(&["true"]))]),
            &mut ctx,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("shell: execute_command: src/commands/missing.command"));
    }
}
