//! Application configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional
//! TOML or JSON file (format chosen by extension) overlaid with environment
//! variables prefixed with `PLEXUS__`. Every section has defaults, so a
//! missing file yields a runnable configuration.

pub mod app;
pub mod logging;
pub mod pipeline;
pub mod plugin;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::logging::LoggingConfig;
use self::pipeline::PipelineConfig;
use self::plugin::PluginConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Request pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Plugin system settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Development mode: internal errors expose their full cause chain.
    #[serde(default)]
    pub dev_mode: bool,
}

impl AppConfig {
    /// Load configuration from an optional file and the environment.
    ///
    /// A path that does not exist is not an error; the defaults apply.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        Self::load_with(path, environment())
    }

    /// Like [`AppConfig::load`], with an explicit environment source.
    pub fn load_with(path: Option<&str>, env: config::Environment) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let config = builder
            .add_source(env)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks values that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.pipeline.allowed_methods.is_empty() {
            return Err(AppError::configuration(
                "pipeline.allowed_methods must name at least one method",
            ));
        }
        for method in &self.pipeline.allowed_methods {
            if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(AppError::configuration(format!(
                    "pipeline.allowed_methods contains an invalid method '{method}'"
                )));
            }
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(AppError::configuration(format!(
                    "logging.format must be 'json' or 'pretty', got '{other}'"
                )));
            }
        }
        if self.plugins.hook_timeout_seconds == Some(0) {
            return Err(AppError::configuration(
                "plugins.hook_timeout_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// The `PLEXUS__SECTION__KEY` environment source.
///
/// List settings take comma-separated values.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("PLEXUS")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("pipeline.allowed_methods")
        .with_list_parse_key("plugins.disabled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pipeline.allowed_methods, vec!["HEAD", "GET", "POST"]);
        assert!(config.plugins.static_files.enabled);
        assert!(!config.dev_mode);
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_env_overrides_lists_and_scalars() {
        let config = AppConfig::load_with(
            None,
            env(&[
                ("PLEXUS__PIPELINE__ALLOWED_METHODS", "GET,POST"),
                ("PLEXUS__PLUGINS__DISABLED", "static"),
                ("PLEXUS__SERVER__PORT", "9000"),
                ("PLEXUS__DEV_MODE", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(config.pipeline.allowed_methods, vec!["GET", "POST"]);
        assert_eq!(config.plugins.disabled, vec!["static"]);
        assert_eq!(config.server.port, 9000);
        assert!(config.dev_mode);
    }

    #[test]
    fn test_env_overrides_file_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.toml");
        std::fs::write(&path, "[pipeline]\nallowed_methods = [\"GET\"]\n").unwrap();

        let config = AppConfig::load_with(
            path.to_str(),
            env(&[("PLEXUS__PIPELINE__ALLOWED_METHODS", "HEAD,GET")]),
        )
        .unwrap();
        assert_eq!(config.pipeline.allowed_methods, vec!["HEAD", "GET"]);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some("/nonexistent/plexus.toml")).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
dev_mode = true

[server]
port = 9090

[pipeline]
allowed_methods = ["GET"]

[plugins]
disabled = ["static"]
hook_timeout_seconds = 5
"#
        )
        .unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        assert!(config.dev_mode);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.pipeline.allowed_methods, vec!["GET"]);
        assert!(!config.plugins.is_enabled("static"));
        assert!(config.plugins.is_enabled("core"));
        assert_eq!(
            config.plugins.hook_timeout(),
            Some(std::time::Duration::from_secs(5))
        );
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, r#"{"dev_mode": true, "logging": {"format": "json"}}"#).unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        assert!(config.dev_mode);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let mut config = AppConfig::default();
        config.pipeline.allowed_methods = vec!["get".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validate_rejects_empty_methods() {
        let mut config = AppConfig::default();
        config.pipeline.allowed_methods.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
