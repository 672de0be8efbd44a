/// `scache list|stats|clear|inspect` command implementations
use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli_utils::{format_bytes, scache_prefix};
use crate::config::ScacheConfig;
use crate::container::Value;
use crate::orchestrator::Cache;
use crate::rule::Group;
use crate::storage::Storage;

fn open(config: &ScacheConfig) -> Result<Cache> {
    Cache::from_config(&config.cache).context("Failed to open cache")
}

/// List cached record files
pub fn list(config: &ScacheConfig, group: Option<Group>) -> Result<()> {
    let cache = open(config)?;
    let listing = cache.list(group)?;

    let total: usize = listing.iter().map(|(_, names)| names.len()).sum();
    if total == 0 {
        println!("No cached records.");
        return Ok(());
    }

    println!("Cached records ({} files):", total);

    for (group, names) in listing {
        if names.is_empty() {
            continue;
        }
        println!();
        if cache.separate_dirs() {
            println!("  {} ({})", group, cache.storage(group).dir().display());
        } else {
            println!("  {}", cache.root().display());
        }
        for name in names {
            println!("    {}", name);
        }
    }

    Ok(())
}

/// Show cache statistics
pub fn stats(config: &ScacheConfig, group: Option<Group>) -> Result<()> {
    let cache = open(config)?;
    let stats = cache.stats(group).context("Failed to get cache statistics")?;

    println!("Cache Statistics");
    println!();
    println!("Root: {}", cache.root().display());
    println!("Backend: {}", config.cache.backend);
    println!();

    let mut total_records = 0;
    let mut total_bytes = 0;

    for (group, stats) in &stats {
        let label = if cache.separate_dirs() {
            group.name()
        } else {
            "all"
        };
        println!(
            "  {:<4} {:>6} records  {:>12}  {}",
            label,
            stats.total_records,
            format_bytes(stats.total_bytes),
            stats.cache_dir.display()
        );
        total_records += stats.total_records;
        total_bytes += stats.total_bytes;
    }

    println!();
    println!("Total records: {}", total_records);
    println!("Total size: {}", format_bytes(total_bytes));

    Ok(())
}

/// Remove cached record files
pub fn clear(config: &ScacheConfig, group: Option<Group>, verbose: u8) -> Result<()> {
    let cache = open(config)?;
    let removed = cache.clear(group)?;

    if verbose >= 2 {
        for path in &removed {
            println!("{} Removed {}", scache_prefix(), path.display());
        }
    }

    if verbose >= 1 {
        let scope = group.map(|g| g.to_string()).unwrap_or_else(|| "all groups".to_string());
        println!(
            "{} Removed {} cached records ({})",
            scache_prefix(),
            removed.len(),
            scope
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct InspectedEntry<'a> {
    path: String,
    value: Option<&'a Value>,
}

/// Show the entries of one record file
pub fn inspect(config: &ScacheConfig, file: &str, group: Group, json: bool) -> Result<()> {
    let cache = open(config)?;
    let storage = cache.storage(group);

    let Some(record) = storage.get(file)? else {
        anyhow::bail!(
            "Record not found: {}",
            storage.path_of(file).display()
        );
    };

    if json {
        let entries: Vec<InspectedEntry<'_>> = record
            .entries
            .iter()
            .map(|(path, value)| InspectedEntry {
                path: path.to_string(),
                value: value.as_ref(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{} ({} entries)", storage.path_of(file).display(), record.len());
    for (path, value) in &record.entries {
        match value {
            Some(value) => println!("  {:<40} {}", path.to_string(), value.summary()),
            None => println!("  {:<40} <missing>", path.to_string()),
        }
    }

    Ok(())
}
