//! The layered template model.
//!
//! A [`RawTemplate`] owns everything needed to generate one build: its
//! identity, its directory fields, and the builder, post-processor and
//! provisioner sections merged from application defaults, distro
//! defaults and an optional named build.

mod dirs;
mod raw;
mod resolve;
mod section;

pub use dirs::{IoDirs, ResolvedDirs, DIR_FIELDS};
pub use raw::{Collaborators, Identity, RawTemplate};
pub use resolve::UnresolvedPlaceholder;
pub use section::{BuildSections, TemplateSection, COMMON};

use crate::component::ComponentError;

/// Errors generating one template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedPlaceholder),

    #[error("{0}: no builder types selected")]
    NoBuilders(String),
}
