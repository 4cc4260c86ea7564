//! Dependency levels.
//!
//! Level 0 holds the plugins with no dependencies; level `k` holds the
//! plugins whose dependencies all sit in levels below `k`. Every plugin
//! lands in exactly one level. A graph that cannot be levelled contains a
//! cycle and is rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use plexus_core::{AppError, AppResult};

use crate::descriptor::PluginDescriptor;

/// Plugin names grouped by dependency level, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Levels(Vec<BTreeSet<String>>);

impl Levels {
    /// Assigns every plugin to a level.
    ///
    /// Fails with a configuration error when a dependency names an unknown
    /// plugin or when the dependencies form a cycle.
    pub fn compute(plugins: &BTreeMap<String, PluginDescriptor>) -> AppResult<Self> {
        for (name, descriptor) in plugins {
            if let Some(missing) = descriptor
                .dependencies
                .iter()
                .find(|dep| !plugins.contains_key(*dep))
            {
                return Err(AppError::configuration(format!(
                    "Plugin '{name}' depends on unknown plugin '{missing}'"
                )));
            }
        }

        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut remaining: BTreeSet<&str> = plugins.keys().map(String::as_str).collect();
        let mut levels = Vec::new();

        while !remaining.is_empty() {
            let level: BTreeSet<String> = remaining
                .iter()
                .filter(|name| {
                    plugins[**name]
                        .dependencies
                        .iter()
                        .all(|dep| placed.contains(dep.as_str()))
                })
                .map(|name| name.to_string())
                .collect();

            if level.is_empty() {
                let unresolved: Vec<&str> = remaining.into_iter().collect();
                return Err(AppError::configuration(format!(
                    "Dependency cycle detected among plugins: {}",
                    unresolved.join(", ")
                )));
            }

            for name in &level {
                remaining.remove(name.as_str());
            }
            for name in &level {
                if let Some((key, _)) = plugins.get_key_value(name) {
                    placed.insert(key.as_str());
                }
            }
            levels.push(level);
        }

        Ok(Self(levels))
    }

    /// The level a plugin belongs to.
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|level| level.contains(name))
    }

    /// Iterates levels in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, BTreeSet<String>> {
        self.0.iter()
    }

    /// All plugin names, levels ascending and names sorted within a level.
    pub fn flatten(&self) -> Vec<&str> {
        self.0
            .iter()
            .flat_map(|level| level.iter().map(String::as_str))
            .collect()
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no levels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> BTreeMap<String, PluginDescriptor> {
        edges
            .iter()
            .map(|(name, deps)| {
                let descriptor = deps
                    .iter()
                    .fold(PluginDescriptor::new(name), |d, dep| d.depends_on(dep));
                (name.to_string(), descriptor)
            })
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let levels = Levels::compute(&BTreeMap::new()).unwrap();
        assert!(levels.is_empty());
        assert!(levels.flatten().is_empty());
    }

    #[test]
    fn test_level_zero_is_dependency_free_set() {
        let plugins = graph(&[
            ("core", &[]),
            ("log", &[]),
            ("web", &["core"]),
            ("api", &["web", "log"]),
            ("admin", &["api", "core"]),
        ]);
        let levels = Levels::compute(&plugins).unwrap();

        let zero: Vec<&str> = levels.iter().next().unwrap().iter().map(String::as_str).collect();
        assert_eq!(zero, vec!["core", "log"]);
        assert_eq!(levels.len(), 4);
        assert_eq!(levels.flatten(), vec!["core", "log", "web", "api", "admin"]);
    }

    #[test]
    fn test_level_exceeds_every_dependency_level() {
        let plugins = graph(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("d", &["b", "c"]),
            ("e", &["a", "d"]),
            ("f", &[]),
            ("g", &["f", "b"]),
        ]);
        let levels = Levels::compute(&plugins).unwrap();

        for (name, descriptor) in &plugins {
            let own = levels.level_of(name).unwrap();
            for dep in &descriptor.dependencies {
                assert!(own > levels.level_of(dep).unwrap(), "{name} vs {dep}");
            }
            if descriptor.dependencies.is_empty() {
                assert_eq!(own, 0);
            }
        }
        assert_eq!(levels.flatten().len(), plugins.len());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let plugins = graph(&[("root", &[]), ("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = Levels::compute(&plugins).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("a, b, c"));
        assert!(!err.message.contains("root"));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let plugins = graph(&[("loop", &["loop"])]);
        assert!(Levels::compute(&plugins).unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let plugins = graph(&[("web", &["core"])]);
        let err = Levels::compute(&plugins).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.message.contains("'web'"));
        assert!(err.message.contains("'core'"));
    }
}
