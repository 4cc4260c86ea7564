//! Plugin descriptors.

use std::collections::BTreeSet;
use std::sync::Arc;

use plexus_pipeline::HandlerFactory;

use crate::command::CommandDescriptor;
use crate::hook::Hook;

/// Everything the orchestrator knows about one plugin.
///
/// Built once by the discovery feed and never modified after registration.
#[derive(Clone)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Plugin version.
    pub version: String,
    /// Short human-readable description.
    pub description: String,
    /// Names of plugins that must start first.
    pub dependencies: BTreeSet<String>,
    /// Runs during start.
    pub init_hook: Option<Arc<dyn Hook>>,
    /// Runs during stop.
    pub stop_hook: Option<Arc<dyn Hook>>,
    /// Handler factories in declaration order.
    pub handler_factories: Vec<Arc<dyn HandlerFactory>>,
    /// Commands exposed on the command line.
    pub commands: Vec<CommandDescriptor>,
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factories: Vec<&str> = self.handler_factories.iter().map(|h| h.name()).collect();
        let commands: Vec<String> = self.commands.iter().map(|c| c.full_name()).collect();
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .field("init_hook", &self.init_hook.is_some())
            .field("stop_hook", &self.stop_hook.is_some())
            .field("handler_factories", &factories)
            .field("commands", &commands)
            .finish()
    }
}

impl PluginDescriptor {
    /// Creates a descriptor with no dependencies, hooks, handlers, or commands.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.0.0".to_string(),
            description: String::new(),
            dependencies: BTreeSet::new(),
            init_hook: None,
            stop_hook: None,
            handler_factories: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Sets the version.
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Adds a dependency.
    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.insert(name.to_string());
        self
    }

    /// Sets the init hook.
    pub fn on_init(mut self, hook: impl Hook + 'static) -> Self {
        self.init_hook = Some(Arc::new(hook));
        self
    }

    /// Sets the stop hook.
    pub fn on_stop(mut self, hook: impl Hook + 'static) -> Self {
        self.stop_hook = Some(Arc::new(hook));
        self
    }

    /// Appends a handler factory.
    pub fn handler(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.handler_factories.push(factory);
        self
    }

    /// Appends a command.
    pub fn command(mut self, command: CommandDescriptor) -> Self {
        self.commands.push(command);
        self
    }
}
