//! Packstead - Packer template generation
//!
//! This crate layers application defaults, per-distro defaults and named
//! build definitions into one template per build, resolves placeholders
//! in names and directories, and translates every selected builder,
//! post-processor and provisioner section into the settings Packer
//! expects.

pub mod builders;
pub mod commands;
pub mod communicator;
pub mod component;
pub mod config;
pub mod diagnostics;
pub mod generate;
pub mod packer;
pub mod post_processors;
pub mod provisioners;
pub mod release;
pub mod template;

pub use config::{AppConfig, Catalog, ConfigError};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use generate::{GenerateError, GeneratedBuild, Generator, Selection};
pub use packer::PackerTemplate;
pub use release::{ReleaseInfo, ReleaseQuery, ReleaseResolver};
pub use template::{Collaborators, RawTemplate, TemplateError, TemplateSection};
