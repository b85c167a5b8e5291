//! Shared machinery for turning a merged template section into the
//! settings map of one builder, post-processor or provisioner kind.
//!
//! Each kind declares a [`Schema`] table of the keys it understands and
//! their types. [`apply_settings`] and [`apply_arrays`] walk a section,
//! resolve placeholders, let the kind claim keys it treats specially, and
//! store everything else by type. Keys a kind does not know are recorded
//! as diagnostics and dropped.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::num::ParseIntError;

use packstead_settings::{parse_setting, ArrayValue, Arrays, Settings, VarBindings};

use crate::commands::{command_path, LineSource};
use crate::diagnostics::Diagnostics;
use crate::release::{ReleaseError, ReleaseInfo, ReleaseQuery, ReleaseResolver};
use crate::template::{Identity, ResolvedDirs, TemplateSection};

/// The resolved, typed settings for one target.
pub type SettingsMap = Map<String, Value>;

/// Which section family a kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    Builder,
    PostProcessor,
    Provisioner,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Builder => "builder",
            Component::PostProcessor => "post-processor",
            Component::Provisioner => "provisioner",
        })
    }
}

/// Errors building one target. Any of these aborts the current build.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("{kind}: {key}: required setting not found")]
    RequiredSetting { kind: String, key: String },

    #[error("{kind}: {key}={value}: invalid integer: {source}")]
    InvalidInt {
        kind: String,
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{kind}: unsupported {component}")]
    Unsupported { kind: String, component: Component },

    #[error("{kind}: {component} configuration not found")]
    MissingSection { kind: String, component: Component },

    #[error("{kind}: {key}: {path}: {source}")]
    CommandFile {
        kind: String,
        key: String,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{kind}: {key}: {path}: no commands found")]
    NoCommands {
        kind: String,
        key: String,
        path: String,
    },

    #[error("{kind}: {value}: invalid communicator")]
    InvalidCommunicator { kind: String, value: String },

    #[error("{kind}: {source}")]
    Release {
        kind: String,
        #[source]
        source: ReleaseError,
    },
}

/// The keys a kind understands, by type, and which of them are required.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub strings: &'static [&'static str],
    pub ints: &'static [&'static str],
    pub bools: &'static [&'static str],
    pub arrays: &'static [&'static str],
    pub required: &'static [&'static str],
}

impl Schema {
    pub const EMPTY: Schema = Schema {
        strings: &[],
        ints: &[],
        bools: &[],
        arrays: &[],
        required: &[],
    };
}

/// Merge the common section's settings under a kind's own settings.
pub fn merged_settings(section: &TemplateSection, common: Option<&TemplateSection>) -> Settings {
    match common {
        Some(common) => packstead_settings::merge_settings(&common.settings, &section.settings),
        None => section.settings.clone(),
    }
}

/// `"true"` in any case is true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Everything a kind builder may consult beyond its own section.
pub struct ComponentContext<'a> {
    pub vars: &'a VarBindings,
    pub identity: &'a Identity,
    pub base_url: &'a str,
    pub dirs: &'a ResolvedDirs,
    pub release_cache: &'a mut Option<ReleaseInfo>,
    pub releases: &'a dyn ReleaseResolver,
    pub lines: &'a dyn LineSource,
    pub diagnostics: &'a mut Diagnostics,
    pub scripts: &'a mut Vec<String>,
}

impl ComponentContext<'_> {
    pub fn resolve(&self, s: &str) -> String {
        self.vars.resolve(s)
    }

    /// Release metadata for this build, looked up at most once.
    pub fn release_info(
        &mut self,
        kind: &str,
        checksum_type: &str,
    ) -> Result<ReleaseInfo, ComponentError> {
        if let Some(info) = self.release_cache.as_ref() {
            return Ok(info.clone());
        }
        let query = ReleaseQuery {
            distro: &self.identity.distro,
            arch: &self.identity.arch,
            image: &self.identity.image,
            release: &self.identity.release,
            base_url: self.base_url,
            checksum_type,
        };
        let info = self
            .releases
            .resolve(&query)
            .map_err(|source| ComponentError::Release {
                kind: kind.to_string(),
                source,
            })?;
        *self.release_cache = Some(info.clone());
        Ok(info)
    }

    /// Release metadata, if an earlier target already looked it up.
    pub fn cached_release(&self) -> Option<&ReleaseInfo> {
        self.release_cache.as_ref()
    }

    /// Read the command file named by setting `key`.
    pub fn read_commands(
        &self,
        kind: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<String>, ComponentError> {
        let path = command_path(&self.dirs.commands_src_dir, value);
        let lines = self
            .lines
            .read_lines(&path)
            .map_err(|source| ComponentError::CommandFile {
                kind: kind.to_string(),
                key: key.to_string(),
                path: path.display().to_string(),
                source,
            })?;
        if lines.is_empty() {
            return Err(ComponentError::NoCommands {
                kind: kind.to_string(),
                key: key.to_string(),
                path: path.display().to_string(),
            });
        }
        Ok(lines)
    }

    /// Output path for a script, recording its name for the copier.
    pub fn script_path(&mut self, name: &str) -> String {
        if !self.scripts.iter().any(|s| s == name) {
            self.scripts.push(name.to_string());
        }
        if name.contains('/') {
            name.to_string()
        } else {
            format!("{}/{}", self.dirs.scripts_dir, name)
        }
    }
}

/// Accumulates the settings map for one target.
pub struct Assembler<'s> {
    component: Component,
    kind: &'s str,
    schema: &'s Schema,
    out: SettingsMap,
    substitutions: Vec<(&'static str, Option<&'static str>)>,
}

impl<'s> Assembler<'s> {
    pub fn new(component: Component, kind: &'s str, schema: &'s Schema) -> Self {
        let mut out = SettingsMap::new();
        out.insert("type".to_string(), Value::String(kind.to_string()));
        Self {
            component,
            kind,
            schema,
            out,
            substitutions: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'s str {
        self.kind
    }

    pub fn component(&self) -> Component {
        self.component
    }

    /// Whether the schema lists `key` as a scalar setting.
    pub fn accepts(&self, key: &str) -> bool {
        self.schema.strings.contains(&key)
            || self.schema.ints.contains(&key)
            || self.schema.bools.contains(&key)
    }

    pub fn accepts_array(&self, name: &str) -> bool {
        self.schema.arrays.contains(&name)
    }

    pub fn has(&self, key: &str) -> bool {
        self.out.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.out.get(key).and_then(Value::as_str)
    }

    /// A stored boolean; false when absent.
    pub fn get_bool(&self, key: &str) -> bool {
        self.out.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.out.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.out.remove(key)
    }

    pub fn store_string(&mut self, key: &str, value: &str) {
        self.insert(key, value);
    }

    pub fn store_int(&mut self, key: &str, value: &str) -> Result<(), ComponentError> {
        let n = value
            .trim()
            .parse::<i64>()
            .map_err(|source| ComponentError::InvalidInt {
                kind: self.kind.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                source,
            })?;
        self.insert(key, n);
        Ok(())
    }

    pub fn store_bool(&mut self, key: &str, value: &str) {
        self.insert(key, parse_bool(value));
    }

    /// Store a scalar setting by its schema type. Returns false for keys
    /// the schema does not list.
    pub fn store(&mut self, key: &str, value: &str) -> Result<bool, ComponentError> {
        if self.schema.strings.contains(&key) {
            self.store_string(key, value);
        } else if self.schema.ints.contains(&key) {
            self.store_int(key, value)?;
        } else if self.schema.bools.contains(&key) {
            self.store_bool(key, value);
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// Store an array the schema lists. Returns false for unknown names.
    pub fn store_array(&mut self, name: &str, value: &ArrayValue, ctx: &mut ComponentContext<'_>) -> bool {
        if !self.schema.arrays.contains(&name) {
            return false;
        }
        let json = match value {
            ArrayValue::List(items) => resolved_list(items, ctx),
            ArrayValue::Overrides(_) => array_to_json(self.kind, value, ctx, &mut keep_item),
        };
        self.insert(name, json);
        true
    }

    /// Check `key` for requiredness as `replacement` instead; `None` drops it.
    pub fn substitute_required(&mut self, key: &'static str, replacement: Option<&'static str>) {
        self.substitutions.push((key, replacement));
    }

    pub fn required_error(&self, key: &str) -> ComponentError {
        ComponentError::RequiredSetting {
            kind: self.kind.to_string(),
            key: key.to_string(),
        }
    }

    pub fn require(&self, key: &str) -> Result<(), ComponentError> {
        if self.has(key) {
            Ok(())
        } else {
            Err(self.required_error(key))
        }
    }

    /// Validate required keys and hand back the finished map.
    pub fn finish(self) -> Result<SettingsMap, ComponentError> {
        for key in self.schema.required {
            let effective = self
                .substitutions
                .iter()
                .find(|(from, _)| from == key)
                .map(|(_, to)| *to)
                .unwrap_or(Some(key));
            if let Some(key) = effective {
                self.require(key)?;
            }
        }
        Ok(self.out)
    }
}

/// Hook for keys a kind handles itself. Returns true when consumed.
pub fn no_setting_rules(
    _: &mut Assembler<'_>,
    _: &str,
    _: &str,
    _: &mut ComponentContext<'_>,
) -> Result<bool, ComponentError> {
    Ok(false)
}

/// Hook for arrays a kind handles itself. Returns true when consumed.
pub fn no_array_rules(
    _: &mut Assembler<'_>,
    _: &str,
    _: &ArrayValue,
    _: &mut ComponentContext<'_>,
) -> Result<bool, ComponentError> {
    Ok(false)
}

/// Walk live settings in order: resolve, offer to `rules`, then store by type.
pub fn apply_settings<'s, 'c, F>(
    asm: &mut Assembler<'s>,
    settings: &Settings,
    ctx: &mut ComponentContext<'c>,
    mut rules: F,
) -> Result<(), ComponentError>
where
    F: FnMut(&mut Assembler<'s>, &str, &str, &mut ComponentContext<'c>) -> Result<bool, ComponentError>,
{
    for setting in settings.live() {
        let value = ctx.resolve(&setting.value);
        if rules(asm, &setting.key, &value, ctx)? {
            continue;
        }
        if !asm.store(&setting.key, &value)? {
            ctx.diagnostics.unknown_setting(asm.kind(), &setting.key);
        }
    }
    Ok(())
}

/// Walk arrays by name: offer to `rules`, then store the ones the schema lists.
pub fn apply_arrays<'s, 'c, F>(
    asm: &mut Assembler<'s>,
    arrays: &Arrays,
    ctx: &mut ComponentContext<'c>,
    mut rules: F,
) -> Result<(), ComponentError>
where
    F: FnMut(&mut Assembler<'s>, &str, &ArrayValue, &mut ComponentContext<'c>) -> Result<bool, ComponentError>,
{
    for (name, value) in arrays.iter() {
        if rules(asm, name, value, ctx)? {
            continue;
        }
        if !asm.store_array(name, value, ctx) {
            ctx.diagnostics.unknown_array(asm.kind(), name);
        }
    }
    Ok(())
}

/// Resolve every element of a list.
pub fn resolved_list(items: &[String], ctx: &ComponentContext<'_>) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| Value::String(ctx.resolve(item)))
            .collect(),
    )
}

/// Turn a list of `key=value` items into an object.
///
/// Items that are not `key=value` are reported and skipped.
pub fn pairs_to_object(
    kind: &str,
    name: &str,
    items: &[String],
    ctx: &mut ComponentContext<'_>,
) -> Value {
    let mut object = Map::new();
    for item in items {
        match parse_setting(item) {
            Ok(pair) => {
                object.insert(pair.key, Value::String(ctx.resolve(&pair.value)));
            }
            Err(e) => ctx.diagnostics.warn(kind, Some(name), e.to_string()),
        }
    }
    Value::Object(object)
}

/// Item mapper used when converting override blocks; receives the array
/// name and the resolved item.
pub type ItemMapper<'m> = dyn FnMut(&str, String, &mut ComponentContext<'_>) -> String + 'm;

fn keep_item(_: &str, item: String, _: &mut ComponentContext<'_>) -> String {
    item
}

/// Convert an array value to JSON.
///
/// Lists become string arrays. Override blocks become an object per
/// target; inside a target, a list named `settings` holds `key=value`
/// scalars and is flattened into the target's object.
pub fn array_to_json(
    kind: &str,
    value: &ArrayValue,
    ctx: &mut ComponentContext<'_>,
    map_item: &mut ItemMapper<'_>,
) -> Value {
    match value {
        ArrayValue::List(items) => list_to_json("", items, ctx, map_item),
        ArrayValue::Overrides(targets) => {
            let mut object = Map::new();
            for (target, arrays) in targets {
                let mut inner = Map::new();
                for (name, value) in arrays.iter() {
                    match value {
                        ArrayValue::List(items) if name == "settings" => {
                            if let Value::Object(pairs) = pairs_to_object(kind, name, items, ctx) {
                                inner.extend(pairs);
                            }
                        }
                        ArrayValue::List(items) => {
                            inner.insert(name.clone(), list_to_json(name, items, ctx, map_item));
                        }
                        ArrayValue::Overrides(_) => {
                            inner.insert(name.clone(), array_to_json(kind, value, ctx, map_item));
                        }
                    }
                }
                object.insert(target.clone(), Value::Object(inner));
            }
            Value::Object(object)
        }
    }
}

fn list_to_json(
    name: &str,
    items: &[String],
    ctx: &mut ComponentContext<'_>,
    map_item: &mut ItemMapper<'_>,
) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| {
                let resolved = ctx.resolve(item);
                Value::String(map_item(name, resolved, ctx))
            })
            .collect(),
    )
}
