//! Amazon EC2 builders.

use serde_json::{Map, Value};

use packstead_settings::{parse_setting, ArrayValue, Arrays};

use super::{object_array, split_rows, BuilderKind};
use crate::commands::{command_from_lines, is_command_file};
use crate::communicator::Communicator;
use crate::component::{
    apply_arrays, apply_settings, merged_settings, parse_bool, Assembler, Component,
    ComponentContext, ComponentError, Schema, SettingsMap,
};
use crate::template::TemplateSection;

const CHROOT: Schema = Schema {
    strings: &[
        "access_key",
        "ami_description",
        "ami_name",
        "ami_virtualization_type",
        "command_wrapper",
        "device_path",
        "mount_path",
        "secret_key",
        "source_ami",
    ],
    ints: &["root_volume_size"],
    bools: &["enhanced_networking", "force_deregister"],
    arrays: &[
        "ami_groups",
        "ami_product_codes",
        "ami_regions",
        "ami_users",
        "chroot_mounts",
        "copy_files",
        "mount_options",
        "tags",
    ],
    required: &["access_key", "ami_name", "secret_key", "source_ami"],
};

const EBS: Schema = Schema {
    strings: &[
        "access_key",
        "ami_description",
        "ami_name",
        "availability_zone",
        "iam_instance_profile",
        "instance_type",
        "region",
        "secret_key",
        "security_group_id",
        "source_ami",
        "spot_price",
        "spot_price_auto_product",
        "ssh_keypair_name",
        "subnet_id",
        "temporary_key_pair_name",
        "token",
        "user_data",
        "user_data_file",
        "vpc_id",
        "windows_password_timeout",
    ],
    ints: &[],
    bools: &[
        "associate_public_ip_address",
        "ebs_optimized",
        "enhanced_networking",
        "force_deregister",
        "ssh_private_ip",
    ],
    arrays: &[
        "ami_block_device_mappings",
        "ami_groups",
        "ami_product_codes",
        "ami_regions",
        "ami_users",
        "launch_block_device_mappings",
        "run_tags",
        "security_group_ids",
        "tags",
    ],
    required: &[
        "access_key",
        "ami_name",
        "instance_type",
        "region",
        "secret_key",
        "source_ami",
        "ssh_username",
    ],
};

const INSTANCE: Schema = Schema {
    strings: &[
        "access_key",
        "account_id",
        "ami_description",
        "ami_name",
        "ami_virtualization_type",
        "availability_zone",
        "bundle_destination",
        "bundle_prefix",
        "bundle_upload_command",
        "bundle_vol_command",
        "iam_instance_profile",
        "instance_type",
        "region",
        "s3_bucket",
        "secret_key",
        "security_group_id",
        "source_ami",
        "spot_price",
        "spot_price_auto_product",
        "ssh_keypair_name",
        "subnet_id",
        "temporary_key_pair_name",
        "user_data",
        "user_data_file",
        "vpc_id",
        "windows_password_timeout",
        "x509_cert_path",
        "x509_key_path",
        "x509_upload_path",
    ],
    ints: &[],
    bools: &[
        "associate_public_ip_address",
        "ebs_optimized",
        "enhanced_networking",
        "force_deregister",
        "ssh_private_ip",
    ],
    arrays: EBS.arrays,
    required: &[
        "access_key",
        "account_id",
        "ami_name",
        "instance_type",
        "region",
        "s3_bucket",
        "secret_key",
        "source_ami",
        "ssh_username",
        "x509_cert_path",
        "x509_key_path",
    ],
};

/// Keys of one block device mapping.
const DEVICE_STRINGS: &[&str] = &["snapshot_id", "virtual_name", "volume_type"];
const DEVICE_INTS: &[&str] = &["iops", "volume_size"];
const DEVICE_BOOLS: &[&str] = &["delete_on_termination", "encrypted", "no_device"];

const OBJECT_ARRAYS: &[&str] = &["run_tags", "tags"];

pub(super) fn chroot(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::AmazonChroot, &CHROOT, section, common, ctx)
}

pub(super) fn ebs(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::AmazonEbs, &EBS, section, common, ctx)
}

pub(super) fn instance(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    build(BuilderKind::AmazonInstance, &INSTANCE, section, common, ctx)
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

    apply_settings(&mut asm, &settings, ctx, |asm, key, value, ctx| {
        if comm.store(asm, key, value, ctx)? {
            return Ok(true);
        }
        match key {
            "bundle_upload_command" | "bundle_vol_command"
                if asm.accepts(key) && is_command_file(value) =>
            {
                let lines = ctx.read_commands(asm.kind(), key, value)?;
                asm.insert(key, command_from_lines(&lines));
                Ok(true)
            }
            _ => Ok(false),
        }
    })?;
    apply_arrays(&mut asm, &section.arrays, ctx, |asm, name, value, ctx| {
        if !asm.accepts_array(name) {
            return Ok(false);
        }
        match (name, value) {
            ("ami_block_device_mappings" | "launch_block_device_mappings", ArrayValue::Overrides(devices)) => {
                let mappings = block_device_mappings(asm.kind(), name, devices, ctx)?;
                asm.insert(name, mappings);
                Ok(true)
            }
            ("chroot_mounts", ArrayValue::List(items)) => {
                asm.insert(name, split_rows(items, ctx));
                Ok(true)
            }
            _ => Ok(object_array(asm, name, value, ctx, OBJECT_ARRAYS)),
        }
    })?;

    comm.adjust_required(&mut asm);
    asm.finish()
}

/// Block device mappings are written as one table per device name, each
/// holding a `settings` list.
fn block_device_mappings(
    kind: &str,
    name: &str,
    devices: &std::collections::BTreeMap<String, Arrays>,
    ctx: &mut ComponentContext<'_>,
) -> Result<Value, ComponentError> {
    let mut mappings = Vec::with_capacity(devices.len());
    for (device, arrays) in devices {
        let mut mapping = Map::new();
        mapping.insert("device_name".to_string(), Value::String(device.clone()));
        for line in arrays.list("settings").unwrap_or_default() {
            let pair = match parse_setting(line) {
                Ok(pair) => pair,
                Err(e) => {
                    ctx.diagnostics.warn(kind, Some(name), e.to_string());
                    continue;
                }
            };
            let value = ctx.resolve(&pair.value);
            let key = pair.key.as_str();
            let json = if DEVICE_STRINGS.contains(&key) {
                Value::String(value)
            } else if DEVICE_INTS.contains(&key) {
                let n = value
                    .parse::<i64>()
                    .map_err(|source| ComponentError::InvalidInt {
                        kind: kind.to_string(),
                        key: format!("{name}.{device}.{key}"),
                        value: value.clone(),
                        source,
                    })?;
                Value::from(n)
            } else if DEVICE_BOOLS.contains(&key) {
                Value::Bool(parse_bool(&value))
            } else {
                ctx.diagnostics
                    .unknown_setting(kind, &format!("{name}.{device}.{key}"));
                continue;
            };
            mapping.insert(pair.key, json);
        }
        mappings.push(Value::Object(mapping));
    }
    Ok(Value::Array(mappings))
}
