//! Plugin system configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Names of compiled-in plugins that must not be registered.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Upper bound for a single init or stop hook. Unbounded when absent.
    #[serde(default)]
    pub hook_timeout_seconds: Option<u64>,
    /// Static file plugin settings.
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

impl PluginConfig {
    /// Returns whether the named plugin is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }

    /// Returns the hook timeout as a `Duration`.
    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_seconds.map(Duration::from_secs)
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    /// Whether the static plugin is registered at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory files are served from.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// URL prefix stripped before resolving against `root`.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// File served when a directory is requested.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            root: default_root(),
            url_prefix: default_url_prefix(),
            index_file: default_index_file(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_root() -> PathBuf {
    PathBuf::from("./web")
}

fn default_url_prefix() -> String {
    "/".to_string()
}

fn default_index_file() -> String {
    "index.html".to_string()
}
