use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use procwire_config::{ConfigLoader, ProcwireConfig};
use procwire_logging::{init_child_logging, init_logging, LogWriter};
use std::path::PathBuf;
use tracing::{info, warn};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Load configuration from file or use defaults
pub(crate) fn load_config(config_path: Option<&PathBuf>) -> Result<ProcwireConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => loader
            .from_file(path)
            .context(format!("Failed to load configuration from {:?}", path)),
        Some(path) => {
            // Logging is not up yet
            eprintln!("Configuration file not found: {:?}. Using defaults.", path);
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // Child mode first: stdout belongs to the IPC channel
    if cli.child {
        init_child_logging(&config.logging, cli.log_level.as_deref())?;
        return commands::child::run().await;
    }

    init_logging(&config.logging, cli.log_level.as_deref(), LogWriter::Stdout)?;

    match cli.command {
        Some(Commands::Interrupt) => commands::interrupt::run(&config.signals).await,
        Some(Commands::Send {
            messages,
            program,
            args,
        }) => {
            let request = commands::send::SendRequest {
                messages,
                program,
                args,
                forward_config: cli.config.clone(),
                forward_log_level: cli.log_level.clone(),
            };
            commands::send::run(request, &config.messenger).await
        }
        Some(Commands::Config { config_cmd }) => {
            commands::config::handle(config_cmd, cli.config.as_ref())
        }
        None => {
            info!("No command specified");
            warn!("Use --help to see the available commands");
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
