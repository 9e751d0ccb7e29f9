// src/config/mod.rs

//! Optional TOML configuration for the `cmdstream` binary.
//!
//! - [`model`] holds the raw serde structs and the validated [`ConfigFile`].
//! - [`loader`] reads a file from disk.
//! - [`validate`] turns a `RawConfigFile` into a `ConfigFile`.
//! - [`duration`] parses `"250ms"`-style strings.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, KillOnSection, RawConfigFile, RunSection};
