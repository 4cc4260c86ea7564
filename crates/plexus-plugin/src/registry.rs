//! Plugin registry: the set of known plugins and their cached levels.

use std::collections::BTreeMap;

use tracing::debug;

use plexus_core::{AppError, AppResult};

use crate::descriptor::PluginDescriptor;
use crate::levels::Levels;

/// Registered plugin descriptors keyed by unique name.
///
/// The [`Levels`] view is recomputed whenever the plugin set changes and
/// cached otherwise.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    plugins: BTreeMap<String, PluginDescriptor>,
    levels: Levels,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a complete set of descriptors.
    ///
    /// Fails on duplicate names, unknown dependencies, or cycles.
    pub fn from_descriptors(descriptors: Vec<PluginDescriptor>) -> AppResult<Self> {
        let mut registry = Self::new();
        registry.extend(descriptors)?;
        Ok(registry)
    }

    /// Adds a batch of descriptors and recomputes the levels once.
    ///
    /// Descriptors in the batch may depend on each other. On failure the
    /// registry is left unchanged.
    pub fn extend(&mut self, descriptors: Vec<PluginDescriptor>) -> AppResult<()> {
        let mut plugins = self.plugins.clone();
        for descriptor in descriptors {
            if plugins.contains_key(&descriptor.name) {
                return Err(AppError::configuration(format!(
                    "Plugin '{}' is registered more than once",
                    descriptor.name
                )));
            }
            plugins.insert(descriptor.name.clone(), descriptor);
        }
        let levels = Levels::compute(&plugins)?;
        debug!(plugins = plugins.len(), levels = levels.len(), "Plugin registry updated");
        self.plugins = plugins;
        self.levels = levels;
        Ok(())
    }

    /// Gets a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    /// All plugin names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// All descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    /// The cached dependency levels.
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_is_rejected() {
        let err = Registry::from_descriptors(vec![
            PluginDescriptor::new("core"),
            PluginDescriptor::new("core"),
        ])
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("'core'"));
    }

    #[test]
    fn test_extend_recomputes_levels() {
        let mut registry = Registry::from_descriptors(vec![PluginDescriptor::new("core")]).unwrap();
        assert_eq!(registry.levels().len(), 1);

        registry
            .extend(vec![PluginDescriptor::new("web").depends_on("core")])
            .unwrap();
        assert_eq!(registry.levels().len(), 2);
        assert_eq!(registry.levels().level_of("web"), Some(1));
        assert_eq!(registry.names(), vec!["core", "web"]);
    }

    #[test]
    fn test_extend_accepts_dependencies_within_the_batch() {
        let mut registry = Registry::new();
        registry
            .extend(vec![
                PluginDescriptor::new("web").depends_on("core"),
                PluginDescriptor::new("core"),
            ])
            .unwrap();
        assert_eq!(registry.levels().level_of("web"), Some(1));
    }

    #[test]
    fn test_extend_rolls_back_on_failure() {
        let mut registry = Registry::from_descriptors(vec![PluginDescriptor::new("core")]).unwrap();
        let before = registry.levels().clone();

        let err = registry
            .extend(vec![
                PluginDescriptor::new("api"),
                PluginDescriptor::new("web").depends_on("missing"),
            ])
            .unwrap_err();
        assert!(registry.get("api").is_none());
        assert!(err.is_configuration());
        assert!(registry.get("web").is_none());
        assert_eq!(registry.levels(), &before);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_cycle_produces_no_registry() {
        let result = Registry::from_descriptors(vec![
            PluginDescriptor::new("a").depends_on("b"),
            PluginDescriptor::new("b").depends_on("a"),
        ]);
        assert!(result.unwrap_err().is_configuration());
    }
}
