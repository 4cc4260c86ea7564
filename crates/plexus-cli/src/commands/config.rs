//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use plexus_core::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Validate,
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, config_path: &str, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let config = super::load_config(config_path)?;
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv("Listen", &config.server.bind_address());
            output::print_kv("Allowed methods", &config.pipeline.allowed_methods.join(", "));
            output::print_kv("Disabled plugins", &config.plugins.disabled.join(", "));
            output::print_kv("Dev mode", &config.dev_mode.to_string());
        }
    }

    Ok(())
}
