use anyhow::Result;
use clap::Parser;

use scache::cli::{Cli, Commands};
use scache::{commands, logging};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // `config` commands must work even when the discovered config is broken
    if let Commands::Config { command } = cli.command {
        logging::init(cli.common.log_level.as_deref().unwrap_or("warn"), None);
        return commands::config::run(command);
    }

    let config = commands::effective_config(&cli.common)?;

    // Initialize structured logging
    logging::init(&config.observability.log_level, config.log_format());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::List { group } => commands::cache::list(&config, group),
        Commands::Stats { group } => commands::cache::stats(&config, group),
        Commands::Clear { group, verbose } => commands::cache::clear(&config, group, verbose),
        Commands::Inspect { file, group, json } => {
            commands::cache::inspect(&config, &file, group, json)
        }
        Commands::Rules { group } => commands::rules::list(&config, group),
        Commands::Config { command } => commands::config::run(command),
    }
}
