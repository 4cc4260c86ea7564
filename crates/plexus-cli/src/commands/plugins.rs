//! Plugin inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use plexus_core::AppResult;
use plexus_plugin::PluginStatus;

use crate::output::{self, OutputFormat};

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Plugins subcommand
    #[command(subcommand)]
    pub command: PluginsCommand,
}

/// Plugins subcommands
#[derive(Debug, Subcommand)]
pub enum PluginsCommand {
    /// List enabled plugins with their dependencies and contributions
    List,
    /// Show the dependency levels plugins start in
    Levels,
    /// Start every plugin, report the outcome, then stop them
    Status,
}

#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    name: String,
    version: String,
    level: usize,
    dependencies: String,
    handlers: String,
    commands: String,
}

#[derive(Debug, Serialize, Tabled)]
struct LevelRow {
    level: usize,
    plugins: String,
}

#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    name: String,
    version: String,
    level: usize,
    state: String,
    since: String,
    error: String,
}

impl From<PluginStatus> for StatusRow {
    fn from(status: PluginStatus) -> Self {
        Self {
            name: status.name,
            version: status.version,
            level: status.level,
            state: status.state.to_string(),
            since: status.since.format("%Y-%m-%d %H:%M:%S").to_string(),
            error: status.error.unwrap_or_default(),
        }
    }
}

/// Execute plugin commands
pub async fn execute(args: &PluginsArgs, config_path: &str, format: OutputFormat) -> AppResult<()> {
    let config = super::load_config(config_path)?;

    match &args.command {
        PluginsCommand::List => {
            let manager = plexus_api::plugins::register_plugins(&config).await?;
            let levels = manager.levels().await;
            let rows: Vec<PluginRow> = manager
                .descriptors()
                .await
                .into_iter()
                .map(|d| PluginRow {
                    level: levels.level_of(&d.name).unwrap_or_default(),
                    dependencies: join(d.dependencies.iter().map(String::as_str)),
                    handlers: join(d.handler_factories.iter().map(|f| f.name())),
                    commands: d
                        .commands
                        .iter()
                        .map(|c| c.full_name())
                        .collect::<Vec<_>>()
                        .join(", "),
                    name: d.name,
                    version: d.version,
                })
                .collect();
            output::print_list(&rows, format);
        }
        PluginsCommand::Levels => {
            let manager = plexus_api::plugins::register_plugins(&config).await?;
            let rows: Vec<LevelRow> = manager
                .levels()
                .await
                .iter()
                .enumerate()
                .map(|(level, names)| LevelRow {
                    level,
                    plugins: join(names.iter().map(String::as_str)),
                })
                .collect();
            output::print_list(&rows, format);
        }
        PluginsCommand::Status => {
            let (manager, report) = plexus_api::plugins::start_plugins(&config).await?;
            let rows: Vec<StatusRow> = manager
                .statuses()
                .await
                .into_iter()
                .map(StatusRow::from)
                .collect();
            output::print_list(&rows, format);
            if !report.is_clean() {
                output::print_warning(&format!(
                    "{} plugin(s) did not start: {}",
                    report.failures.len(),
                    report.failed_names().join(", ")
                ));
            }
            manager.stop().await;
        }
    }

    Ok(())
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}
