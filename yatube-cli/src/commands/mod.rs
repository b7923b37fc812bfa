//! Command implementations for the yatube CLI

pub mod group;
pub mod migrate;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use yatube_server::ServerConfig;

pub use group::run_group;
pub use migrate::run_migrate;
pub use serve::run_serve;

/// Config file, then `YATUBE_*` environment.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    ServerConfig::load(path).context("Failed to load configuration")
}
