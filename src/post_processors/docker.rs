use crate::component::Schema;

pub(super) const IMPORT: Schema = Schema {
    strings: &["repository", "tag"],
    ints: &[],
    bools: &[],
    arrays: &["except", "only"],
    required: &["repository"],
};

pub(super) const PUSH: Schema = Schema {
    strings: &["login_email", "login_password", "login_server", "login_username"],
    ints: &[],
    bools: &["login"],
    arrays: &["except", "only"],
    required: &[],
};

pub(super) const SAVE: Schema = Schema {
    strings: &["path"],
    ints: &[],
    bools: &[],
    arrays: &["except", "only"],
    required: &["path"],
};

pub(super) const TAG: Schema = Schema {
    strings: &["repository", "tag"],
    ints: &[],
    bools: &["force"],
    arrays: &["except", "only"],
    required: &["repository"],
};
