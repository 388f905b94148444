//! Connector parameters.
//!
//! The host hands every repository operation a bag of typed key/value
//! parameters. This crate models that bag as [`Parameters`], exposes the
//! reserved keys the filesystem connector understands, and derives the
//! higher-level settings (date filter, sidecar format, delete behaviour)
//! from them.
//!
//! Parameters can also be assembled locally with [`load`], which merges an
//! optional TOML/YAML/JSON file with `DOCFS_*` environment variables.

pub mod error;
mod load;
mod params;

pub use crate::load::{ENV_PREFIX, default_config_file, load};
pub use crate::params::{Parameters, TimeRange, Value, keys};
