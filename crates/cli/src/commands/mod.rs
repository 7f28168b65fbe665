//! Command implementations.

mod generate;
mod info;
mod validate;

pub use generate::run_generate;
pub use info::run_info;
pub use validate::run_validate;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use contracts::WarehouseConfig;

use crate::error::CliError;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "feedsql.toml";

/// Load configuration from `path`, or `feedsql.toml` if present, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<WarehouseConfig> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(CliError::config_not_found(path.display().to_string()).into());
        }
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                info!("No configuration file, using defaults");
                return Ok(WarehouseConfig::default());
            }
            fallback
        }
    };

    info!(config = %path.display(), "Loading configuration");
    config_loader::ConfigLoader::load_from_path(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
