//! Configuration module for assetpack
//!
//! Provides types, parsing and discovery for `assetpack.toml` project
//! configuration.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, find_config_from, load_config, load_config_file,
    merge_cli_overrides, project_root, resolve_path, CliOverrides, ConfigError, CONFIG_FILENAME,
};
pub use schema::*;
