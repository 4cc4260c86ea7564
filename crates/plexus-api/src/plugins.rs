//! Compiled-in plugins.

use tracing::info;

use plexus_core::AppResult;
use plexus_core::config::AppConfig;
use plexus_plugin::{LifecycleOptions, PluginDescriptor, PluginManager, StartReport};
use plugin_static::static_plugin;

use crate::builtin::core_plugin;

/// Descriptors of every compiled-in plugin enabled by `config`.
pub fn compiled_plugins(config: &AppConfig) -> Vec<PluginDescriptor> {
    let mut plugins = vec![core_plugin()];
    if config.plugins.static_files.enabled {
        plugins.push(static_plugin(&config.plugins.static_files));
    }

    let (enabled, disabled): (Vec<_>, Vec<_>) = plugins
        .into_iter()
        .partition(|p| config.plugins.is_enabled(&p.name));
    for plugin in &disabled {
        info!(plugin = %plugin.name, "Plugin disabled by configuration");
    }
    enabled
}

/// A manager with every enabled plugin registered but not started.
pub async fn register_plugins(config: &AppConfig) -> AppResult<PluginManager> {
    let manager = PluginManager::new(LifecycleOptions::from_config(&config.plugins));
    manager.register(compiled_plugins(config)).await?;
    Ok(manager)
}

/// A manager with every enabled plugin registered and started.
pub async fn start_plugins(config: &AppConfig) -> AppResult<(PluginManager, StartReport)> {
    let manager = register_plugins(config).await?;
    let report = manager.start().await?;
    Ok((manager, report))
}
