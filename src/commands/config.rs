use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::cli::ConfigCommands;
use crate::config::ScacheConfig;
use crate::config_discovery::discover_config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Example => example(),
        ConfigCommands::Validate { path } => match path {
            Some(path) => validate(&path),
            None => {
                let Some(path) = discover_config(&std::env::current_dir()?)? else {
                    anyhow::bail!("No scache.toml found; pass a config file path");
                };
                validate(&path)
            }
        },
    }
}

fn validate(path: &Path) -> Result<()> {
    info!("Validating config file: {}", path.display());

    let config = ScacheConfig::from_file(path)?;
    config.validate()?;

    println!("✓ Configuration file is valid: {}", path.display());
    println!("\nSummary:");
    println!("  - Cache directory: {}", config.cache.root_dir().display());
    println!("  - Backend: {}", config.cache.backend);
    println!(
        "  - Layout: {}",
        if config.cache.separate_dirs {
            "one directory per group (pp, tl, pl)"
        } else {
            "shared directory"
        }
    );
    println!("  - Rules: {}", config.rules.len());

    for (i, rule) in config.rules.iter().enumerate() {
        println!("    {}. {} ({})", i + 1, rule.name, rule.group);
    }

    Ok(())
}

fn example() -> Result<()> {
    println!("{}", ScacheConfig::example()?);
    Ok(())
}
