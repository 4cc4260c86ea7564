//! Request pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings applied when the handler chain is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Request methods that reach the handler chain. Anything else is
    /// answered with "method not allowed" without invoking a handler.
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_methods: default_allowed_methods(),
        }
    }
}

fn default_allowed_methods() -> Vec<String> {
    vec!["HEAD".to_string(), "GET".to_string(), "POST".to_string()]
}
