use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ScacheConfig;

/// Project-level configuration file name
pub const CONFIG_FILE_NAME: &str = "scache.toml";

/// Discovers scache configuration by traversing up the directory tree
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Ok(Some(config_path));
        }

        // Try to go up one level
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    // Fallback to global config
    if let Some(global_config) = global_config_path() {
        if global_config.is_file() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// `~/.config/scache/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/scache/config.toml"))
}

/// Loads configuration with auto-discovery support
///
/// If `explicit_path` is provided, loads config from that path.
/// Otherwise, auto-discovers config by traversing up directory tree from cwd.
///
/// Returns Ok(None) if no config is found (neither explicit nor discovered).
pub fn load_config_with_discovery(explicit_path: Option<&Path>) -> Result<Option<ScacheConfig>> {
    if let Some(config_path) = explicit_path {
        return Ok(Some(ScacheConfig::from_file(config_path)?));
    }

    let current_dir =
        std::env::current_dir().context("Failed to get current directory for config discovery")?;

    match discover_config(&current_dir)? {
        Some(discovered_path) => {
            debug!(config = %discovered_path.display(), "configuration discovered");
            Ok(Some(ScacheConfig::from_file(&discovered_path)?))
        }
        None => Ok(None),
    }
}
