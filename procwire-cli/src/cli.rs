//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Run as echo child process (internal use)
    #[arg(long, hide = true)]
    pub child: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wait for Ctrl+C, then exit with the configured status
    Interrupt,

    /// Spawn a child process, send it messages and print its replies
    Send {
        /// Message to send; repeat for several (default: "I love you")
        #[arg(long = "message", short = 'm', value_name = "TEXT")]
        messages: Vec<String>,

        /// Child program to run instead of the built-in echo child
        #[arg(long, value_name = "PATH")]
        program: Option<PathBuf>,

        /// Argument for --program; repeat for several
        #[arg(long = "arg", value_name = "ARG", requires = "program", allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a sample configuration file with every default spelled out
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
