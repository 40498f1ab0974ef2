//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Dashport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Dashport - scheduled dashboard export runner
#[derive(Parser, Debug)]
#[command(name = "dashport")]
#[command(version, about, long_about = None)]
#[command(author = "Dashport Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dashport.toml", env = "DASHPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DASHPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for the daily trigger time and export every topic
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show recent runs and the next scheduled run
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Commands {
    /// Whether the command writes to the configured log files
    pub fn uses_file_logging(&self) -> bool {
        matches!(self, Commands::Run(_))
    }
}
