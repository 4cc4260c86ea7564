//! Plugin-contributed command line commands.
//!
//! The core only describes commands. Mapping them onto an argument parser
//! and running them is left to the command surface.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;

use plexus_core::AppResult;

/// A positional argument.
#[derive(Debug, Clone, Serialize)]
pub struct ArgumentSpec {
    /// Argument name.
    pub name: String,
    /// Help text.
    pub description: String,
    /// Whether the argument must be given.
    pub required: bool,
    /// Value used when the argument is omitted.
    pub default_value: Option<String>,
}

impl ArgumentSpec {
    /// A required argument.
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default_value: None,
        }
    }

    /// An optional argument with an optional default.
    pub fn optional(name: &str, description: &str, default_value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default_value: default_value.map(str::to_string),
        }
    }
}

/// A `--long` option.
#[derive(Debug, Clone, Serialize)]
pub struct OptionSpec {
    /// Long name without the leading dashes.
    pub long: String,
    /// Optional single-character alias.
    pub short: Option<char>,
    /// Help text.
    pub description: String,
    /// Whether the option takes a value. Otherwise it is a flag.
    pub takes_value: bool,
    /// Value used when the option is omitted.
    pub default_value: Option<String>,
}

impl OptionSpec {
    /// An option that takes a value.
    pub fn value(long: &str, description: &str, default_value: Option<&str>) -> Self {
        Self {
            long: long.to_string(),
            short: None,
            description: description.to_string(),
            takes_value: true,
            default_value: default_value.map(str::to_string),
        }
    }

    /// A boolean flag.
    pub fn flag(long: &str, description: &str) -> Self {
        Self {
            long: long.to_string(),
            short: None,
            description: description.to_string(),
            takes_value: false,
            default_value: None,
        }
    }

    /// Sets the short alias.
    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }
}

/// Resolved values passed to a command action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Full command name as typed.
    pub command: String,
    /// Positional argument values by name.
    pub arguments: BTreeMap<String, String>,
    /// Option values by long name. Flags map to `"true"` when set.
    pub options: BTreeMap<String, String>,
}

impl CommandInvocation {
    /// Gets an argument value.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).map(String::as_str)
    }

    /// Gets an option value.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Returns whether a flag was set.
    pub fn flag(&self, name: &str) -> bool {
        self.option(name) == Some("true")
    }
}

/// The work a command performs.
#[async_trait]
pub trait CommandAction: Send + Sync + std::fmt::Debug {
    /// Runs the command.
    async fn run(&self, invocation: CommandInvocation) -> AppResult<()>;
}

type ActionFn = dyn Fn(CommandInvocation) -> BoxFuture<'static, AppResult<()>> + Send + Sync;

/// A command action backed by an async closure.
pub struct ClosureAction {
    action: Arc<ActionFn>,
}

impl std::fmt::Debug for ClosureAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureAction")
            .field("action", &"<closure>")
            .finish()
    }
}

impl ClosureAction {
    /// Creates a new closure-based action.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn(CommandInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self {
            action: Arc::new(move |inv| -> BoxFuture<'static, AppResult<()>> {
                Box::pin(action(inv))
            }),
        }
    }
}

#[async_trait]
impl CommandAction for ClosureAction {
    async fn run(&self, invocation: CommandInvocation) -> AppResult<()> {
        (self.action)(invocation).await
    }
}

/// A command contributed by a plugin.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    /// Namespace prefix, typically the plugin's short name.
    pub realm: Option<String>,
    /// Command name within the realm.
    pub name: String,
    /// Help text.
    pub description: String,
    /// Positional arguments in order.
    pub arguments: Vec<ArgumentSpec>,
    /// Options.
    pub options: Vec<OptionSpec>,
    /// What the command does.
    pub action: Arc<dyn CommandAction>,
}

impl CommandDescriptor {
    /// Creates a command with no arguments or options.
    pub fn new(name: &str, action: impl CommandAction + 'static) -> Self {
        Self {
            realm: None,
            name: name.to_string(),
            description: String::new(),
            arguments: Vec::new(),
            options: Vec::new(),
            action: Arc::new(action),
        }
    }

    /// Sets the realm.
    pub fn realm(mut self, realm: &str) -> Self {
        self.realm = Some(realm.to_string());
        self
    }

    /// Sets the help text.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Adds a positional argument.
    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Adds an option.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Name the command is invoked by: `realm-name`, or `name` without a realm.
    pub fn full_name(&self) -> String {
        match &self.realm {
            Some(realm) => format!("{realm}-{}", self.name),
            None => self.name.clone(),
        }
    }
}
