//! Hosted cloud builders.

use super::{standard, BuilderKind};
use crate::component::{ComponentContext, ComponentError, Schema, SettingsMap};
use crate::template::TemplateSection;

const DIGITALOCEAN: Schema = Schema {
    strings: &[
        "api_token",
        "droplet_name",
        "image",
        "region",
        "size",
        "snapshot_name",
        "state_timeout",
        "user_data",
    ],
    ints: &[],
    bools: &["private_networking"],
    arrays: &[],
    required: &["api_token", "image", "region", "size"],
};

const GOOGLECOMPUTE: Schema = Schema {
    strings: &[
        "account_file",
        "address",
        "image_description",
        "image_name",
        "instance_name",
        "machine_type",
        "network",
        "project_id",
        "source_image",
        "state_timeout",
        "zone",
    ],
    ints: &["disk_size"],
    bools: &["preemptible", "use_internal_ip"],
    arrays: &["metadata", "tags"],
    required: &["project_id", "source_image", "zone"],
};

const OPENSTACK: Schema = Schema {
    strings: &[
        "api_key",
        "availability_zone",
        "flavor",
        "floating_ip",
        "floating_ip_pool",
        "image_name",
        "password",
        "region",
        "source_image",
        "ssh_interface",
        "tenant_id",
        "tenant_name",
        "username",
    ],
    ints: &[],
    bools: &["config_drive", "insecure", "rackconnect_wait", "use_floating_ip"],
    arrays: &["metadata", "networks", "security_groups"],
    required: &["flavor", "image_name", "password", "source_image", "username"],
};

pub(super) fn digitalocean(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    standard(BuilderKind::DigitalOcean, &DIGITALOCEAN, section, common, ctx, &[])
}

pub(super) fn googlecompute(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    standard(BuilderKind::GoogleCompute, &GOOGLECOMPUTE, section, common, ctx, &["metadata"])
}

pub(super) fn openstack(
    section: &TemplateSection,
    common: Option<&TemplateSection>,
    ctx: &mut ComponentContext<'_>,
) -> Result<SettingsMap, ComponentError> {
    standard(BuilderKind::OpenStack, &OPENSTACK, section, common, ctx, &["metadata"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::testing::{list, section, Harness};
    use serde_json::json;

    #[test]
    fn test_digitalocean() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let out = digitalocean(
            &section(
                &[
                    "api_token=tok",
                    "image=ubuntu-16-04-x64",
                    "region=nyc3",
                    "size=512mb",
                    "private_networking=true",
                    "droplet_name=:name",
                ],
                vec![],
            ),
            None,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out["private_networking"], true);
        assert_eq!(out["droplet_name"], "ubuntu-16.04-amd64-server");

        let err = digitalocean(&section(&["api_token=tok"], vec![]), None, &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "digitalocean: image: required setting not found");
    }

    #[test]
    fn test_googlecompute_metadata_object_and_tag_list() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let out = googlecompute(
            &section(
                &["project_id=p", "source_image=debian-8", "zone=us-central1-a", "disk_size=50"],
                vec![
                    ("metadata", list(&["startup-script=echo hi"])),
                    ("tags", list(&["web", "packer"])),
                ],
            ),
            None,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out["disk_size"], 50);
        assert_eq!(out["metadata"], json!({"startup-script": "echo hi"}));
        assert_eq!(out["tags"], json!(["web", "packer"]));
    }

    #[test]
    fn test_openstack() {
        let mut h = Harness::new();
        let mut ctx = h.ctx();
        let out = openstack(
            &section(
                &[
                    "flavor=m1.small",
                    "image_name=web",
                    "password=pw",
                    "source_image=abc",
                    "username=admin",
                    "ssh_username=ubuntu",
                    "insecure=TRUE",
                ],
                vec![("networks", list(&["net-1", "net-2"]))],
            ),
            None,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(out["insecure"], true);
        assert_eq!(out["networks"], json!(["net-1", "net-2"]));
        assert_eq!(out["ssh_username"], "ubuntu");
    }
}
