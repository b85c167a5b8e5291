//! Layered settings primitives for packstead.
//!
//! Three pieces live here, none of which touch the filesystem:
//! - [`Settings`]: an ordered list of `key=value` settings whose merge
//!   replaces colliding keys in place and appends new ones.
//! - [`Arrays`]: named array values, either plain string lists or
//!   per-target override blocks that merge recursively.
//! - [`VarBindings`]: the placeholder map used to expand `:name` style
//!   references embedded in setting values.

mod array;
mod error;
mod setting;
mod settings;
mod vars;

pub use array::{merge_arrays, ArrayValue, Arrays};
pub use error::SettingsError;
pub use setting::{parse_setting, Setting};
pub use settings::{merge_settings, Settings};
pub use vars::{resolve, VarBindings, DEFAULT_DELIMITER};
