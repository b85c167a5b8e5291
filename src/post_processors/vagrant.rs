use crate::component::Schema;

/// `override` holds per-builder settings, keyed by builder kind.
pub(super) const VAGRANT: Schema = Schema {
    strings: &["output", "vagrantfile_template"],
    ints: &["compression_level"],
    bools: &["keep_input_artifact"],
    arrays: &["except", "include", "only", "override"],
    required: &[],
};

pub(super) const CLOUD: Schema = Schema {
    strings: &[
        "access_token",
        "box_download_url",
        "box_tag",
        "vagrant_cloud_url",
        "version",
        "version_description",
    ],
    ints: &[],
    bools: &["no_release"],
    arrays: &["except", "only"],
    required: &["access_token", "box_tag", "version"],
};
