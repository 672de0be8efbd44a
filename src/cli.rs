use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::rule::Group;

/// scache - attribute-level result cache for annotated data
///
/// Inspects and maintains the record files written by cached computations.
#[derive(Parser, Debug)]
#[command(name = "scache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Attribute-level result cache for annotated data", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Common configuration arguments shared across commands
#[derive(Parser, Debug, Clone)]
pub struct CommonConfigArgs {
    /// Config file path
    #[arg(short = 'c', long, global = true, env = "SCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root cache directory
    #[arg(long, global = true, env = "SCACHE_CACHE_DIR")]
    pub cache_dir: Option<String>,

    /// Record codec (bincode|zstd)
    #[arg(long, global = true, env = "SCACHE_BACKEND")]
    pub backend: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "SCACHE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cached record files
    List {
        /// Only this group (pp, tl, pl)
        #[arg(short, long, value_parser = parse_group)]
        group: Option<Group>,
    },

    /// Show cache statistics
    Stats {
        /// Only this group (pp, tl, pl)
        #[arg(short, long, value_parser = parse_group)]
        group: Option<Group>,
    },

    /// Remove cached record files
    Clear {
        /// Only this group (pp, tl, pl)
        #[arg(short, long, value_parser = parse_group)]
        group: Option<Group>,

        /// Print a summary (-v) or every removed file (-vv)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Show the entries of one record file
    Inspect {
        /// Record file name, with or without extension
        file: String,

        /// Group the record belongs to
        #[arg(short, long, value_parser = parse_group, default_value = "tl")]
        group: Group,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known rules
    Rules {
        /// Only this group (pp, tl, pl)
        #[arg(short, long, value_parser = parse_group)]
        group: Option<Group>,
    },

    /// Configuration management utilities
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print an example configuration
    Example,

    /// Validate a configuration file
    Validate {
        /// Config file path, defaults to the discovered one
        path: Option<PathBuf>,
    },
}

fn parse_group(value: &str) -> Result<Group, String> {
    value.parse::<Group>().map_err(|e| e.to_string())
}
