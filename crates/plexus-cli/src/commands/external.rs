//! Plugin-contributed commands.
//!
//! Plugins describe their commands with [`CommandDescriptor`]s. The parser
//! for each one is built at runtime, after the plugins have started.

use clap::{Arg, ArgAction, ArgMatches, Command};

use plexus_core::{AppError, AppResult};
use plexus_plugin::{CommandDescriptor, CommandInvocation};

/// Execute a plugin command. `args[0]` is the command name.
pub async fn execute(args: &[String], config_path: &str) -> AppResult<()> {
    let Some(name) = args.first() else {
        return Err(AppError::validation("No command given"));
    };

    let config = super::load_config(config_path)?;
    let (manager, _) = plexus_api::plugins::start_plugins(&config).await?;
    let commands = manager.commands().await;

    let result = match commands.iter().find(|c| c.full_name() == *name) {
        Some(descriptor) => run(descriptor, args).await,
        None => {
            let mut available: Vec<String> = commands.iter().map(|c| c.full_name()).collect();
            available.sort();
            Err(AppError::not_found(format!(
                "Unknown command '{name}'. Available plugin commands: {}",
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            )))
        }
    };

    manager.stop().await;
    result
}

async fn run(descriptor: &CommandDescriptor, args: &[String]) -> AppResult<()> {
    let matches = match build_command(descriptor).try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return Ok(());
        }
        Err(e) => return Err(AppError::validation(e.to_string())),
    };
    let invocation = invocation(descriptor, &matches);
    tracing::debug!(command = %invocation.command, "Running plugin command");
    descriptor.action.run(invocation).await
}

/// Builds the parser for one plugin command.
pub fn build_command(descriptor: &CommandDescriptor) -> Command {
    let mut command = Command::new(descriptor.full_name()).about(descriptor.description.clone());

    for spec in &descriptor.arguments {
        let mut arg = Arg::new(spec.name.clone())
            .help(spec.description.clone())
            .required(spec.required)
            .action(ArgAction::Set);
        if let Some(default) = &spec.default_value {
            arg = arg.default_value(default.clone());
        }
        command = command.arg(arg);
    }

    for spec in &descriptor.options {
        let mut arg = Arg::new(spec.long.clone())
            .long(spec.long.clone())
            .help(spec.description.clone());
        if let Some(short) = spec.short {
            arg = arg.short(short);
        }
        if spec.takes_value {
            arg = arg.action(ArgAction::Set);
            if let Some(default) = &spec.default_value {
                arg = arg.default_value(default.clone());
            }
        } else {
            arg = arg.action(ArgAction::SetTrue);
        }
        command = command.arg(arg);
    }

    command
}

/// Collects the parsed values of a plugin command.
pub fn invocation(descriptor: &CommandDescriptor, matches: &ArgMatches) -> CommandInvocation {
    let mut invocation = CommandInvocation {
        command: descriptor.full_name(),
        ..Default::default()
    };
    for spec in &descriptor.arguments {
        if let Some(value) = matches.get_one::<String>(&spec.name) {
            invocation.arguments.insert(spec.name.clone(), value.clone());
        }
    }
    for spec in &descriptor.options {
        if spec.takes_value {
            if let Some(value) = matches.get_one::<String>(&spec.long) {
                invocation.options.insert(spec.long.clone(), value.clone());
            }
        } else if matches.get_flag(&spec.long) {
            invocation.options.insert(spec.long.clone(), "true".to_string());
        }
    }
    invocation
}
