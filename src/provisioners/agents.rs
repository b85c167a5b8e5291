//! Configuration-management agents: Ansible, Chef, Puppet and Salt.

use packstead_settings::ArrayValue;

use crate::component::{pairs_to_object, Assembler, ComponentContext, ComponentError, Schema};

/// Ansible run from the host against the guest over SSH.
pub(super) const ANSIBLE: Schema = Schema {
    strings: &[
        "host_alias",
        "local_port",
        "playbook_file",
        "sftp_command",
        "ssh_authorized_key_file",
        "ssh_host_key_file",
        "user",
    ],
    ints: &[],
    bools: &[],
    arrays: &[
        "ansible_env_vars",
        "empty_groups",
        "except",
        "extra_arguments",
        "groups",
        "only",
        "override",
    ],
    required: &["playbook_file"],
};

pub(super) const ANSIBLE_LOCAL: Schema = Schema {
    strings: &[
        "command",
        "group_vars",
        "host_vars",
        "inventory_file",
        "inventory_groups",
        "playbook_dir",
        "playbook_file",
        "staging_directory",
    ],
    ints: &[],
    bools: &[],
    arrays: &["except", "extra_arguments", "only", "override", "playbook_paths", "role_paths"],
    required: &["playbook_file"],
};

pub(super) const CHEF_CLIENT: Schema = Schema {
    strings: &[
        "chef_environment",
        "client_key",
        "config_template",
        "encrypted_data_bag_secret_path",
        "execute_command",
        "guest_os_type",
        "install_command",
        "node_name",
        "server_url",
        "ssl_verify_mode",
        "staging_directory",
        "validation_client_name",
        "validation_key_path",
    ],
    ints: &[],
    bools: &["prevent_sudo", "skip_clean_client", "skip_clean_node", "skip_install"],
    arrays: &["except", "json", "only", "override", "run_list"],
    required: &[],
};

pub(super) const CHEF_SOLO: Schema = Schema {
    strings: &[
        "chef_environment",
        "config_template",
        "data_bags_path",
        "encrypted_data_bag_secret_path",
        "environments_path",
        "execute_command",
        "guest_os_type",
        "install_command",
        "roles_path",
        "staging_directory",
    ],
    ints: &[],
    bools: &["prevent_sudo", "skip_install"],
    arrays: &[
        "cookbook_paths",
        "except",
        "json",
        "only",
        "override",
        "remote_cookbook_paths",
        "run_list",
    ],
    required: &[],
};

pub(super) const PUPPET_MASTERLESS: Schema = Schema {
    strings: &[
        "execute_command",
        "hiera_config_path",
        "manifest_dir",
        "manifest_file",
        "staging_directory",
        "working_directory",
    ],
    ints: &[],
    bools: &["ignore_exit_codes", "prevent_sudo"],
    arrays: &["except", "extra_arguments", "facter", "module_paths", "only", "override"],
    required: &["manifest_file"],
};

pub(super) const PUPPET_SERVER: Schema = Schema {
    strings: &[
        "client_cert_path",
        "client_private_key_path",
        "options",
        "puppet_node",
        "puppet_server",
        "staging_directory",
    ],
    ints: &[],
    bools: &["ignore_exit_codes", "prevent_sudo"],
    arrays: &["except", "facter", "only", "override"],
    required: &[],
};

pub(super) const SALT_MASTERLESS: Schema = Schema {
    strings: &[
        "bootstrap_args",
        "local_pillar_roots",
        "local_state_tree",
        "log_level",
        "minion_config",
        "remote_pillar_roots",
        "remote_state_tree",
        "temp_config_dir",
    ],
    ints: &[],
    bools: &["disable_sudo", "no_exit_on_failure", "skip_bootstrap"],
    arrays: &["except", "only", "override"],
    required: &["local_state_tree"],
};

/// Chef's `json` attributes and Puppet's `facter` facts are written as
/// `key=value` items.
pub(super) fn object_array(
    asm: &mut Assembler<'_>,
    name: &str,
    value: &ArrayValue,
    ctx: &mut ComponentContext<'_>,
) -> Result<bool, ComponentError> {
    if !matches!(name, "json" | "facter") || !asm.accepts_array(name) {
        return Ok(false);
    }
    match value.as_list() {
        Some(items) => {
            let object = pairs_to_object(asm.kind(), name, items, ctx);
            asm.insert(name, object);
        }
        None => ctx
            .diagnostics
            .warn(asm.kind(), Some(name), "expected a list of key=value attributes"),
    }
    Ok(true)
}
