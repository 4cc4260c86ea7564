//! CLI command definitions and dispatch.

pub mod config;
pub mod external;
pub mod plugins;
pub mod serve;

use clap::{Parser, Subcommand};

use plexus_core::AppResult;
use plexus_core::config::AppConfig;

use crate::output::OutputFormat;

/// Plexus: a plugin-driven HTTP server
#[derive(Debug, Parser)]
#[command(name = "plexus", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PLEXUS_CONFIG", default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the Plexus server
    Serve(serve::ServeArgs),
    /// Inspect compiled-in plugins
    Plugins(plugins::PluginsArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// A command contributed by a plugin
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Cli {
    /// Whether the server is being started.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve(_))
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.config).await,
            Commands::Plugins(args) => plugins::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
            Commands::External(args) => external::execute(args, &self.config).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> AppResult<AppConfig> {
    AppConfig::load(Some(config_path))
}
