pub mod cache;
pub mod config;
pub mod rules;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::CommonConfigArgs;
use crate::config::ScacheConfig;
use crate::config_discovery::load_config_with_discovery;

/// Configuration file (explicit or discovered) with command line overrides applied
pub fn effective_config(common: &CommonConfigArgs) -> Result<ScacheConfig> {
    let mut config = match load_config_with_discovery(common.config.as_deref())? {
        Some(config) => config,
        None => {
            debug!("No configuration file found, using defaults");
            ScacheConfig::default()
        }
    };

    if let Some(dir) = &common.cache_dir {
        config.cache.dir = Some(dir.clone());
    }
    if let Some(backend) = &common.backend {
        config.cache.backend = backend.clone();
    }
    if let Some(level) = &common.log_level {
        config.observability.log_level = level.clone();
    }

    config.validate().context("Configuration is invalid")?;

    Ok(config)
}
