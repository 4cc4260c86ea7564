//! Lifecycle states and batch reports.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a plugin is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Known to the registry, not started yet.
    Registered,
    /// Init hook succeeded, or there was none.
    Started,
    /// Init or stop hook failed.
    Failed,
    /// Not started because a dependency did not start.
    SkippedByDependency,
    /// Stop hook ran.
    Stopped,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Started => write!(f, "started"),
            Self::Failed => write!(f, "failed"),
            Self::SkippedByDependency => write!(f, "skipped_by_dependency"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginStatus {
    /// Plugin name.
    pub name: String,
    /// Plugin version.
    pub version: String,
    /// Dependency level.
    pub level: usize,
    /// Current state.
    pub state: PluginState,
    /// Last failure, if any.
    pub error: Option<String>,
    /// When the plugin entered `state`.
    pub since: DateTime<Utc>,
}

/// Why a plugin did not start or stop cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The hook returned an error or panicked.
    Hook(String),
    /// The named dependency did not start.
    Dependency(String),
    /// The hook exceeded the configured timeout.
    Timeout(Duration),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hook(message) => write!(f, "hook failed: {message}"),
            Self::Dependency(dependency) => write!(f, "dependency '{dependency}' did not start"),
            Self::Timeout(limit) => write!(f, "hook timed out after {}s", limit.as_secs_f64()),
        }
    }
}

/// One failed plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFailure {
    /// Plugin name.
    pub plugin: String,
    /// What went wrong.
    pub reason: FailureReason,
}

/// Result of a start phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartReport {
    /// Plugins that started, in start order.
    pub started: Vec<String>,
    /// Plugins that failed or were skipped, in start order.
    pub failures: Vec<PluginFailure>,
}

impl StartReport {
    /// Names of every plugin that did not start.
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.plugin.as_str()).collect()
    }

    /// Returns `true` if every plugin started.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a stop phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Plugins whose stop hook ran cleanly, in stop order.
    pub stopped: Vec<String>,
    /// Plugins whose stop hook failed.
    pub failures: Vec<PluginFailure>,
}

impl StopReport {
    /// Returns `true` if every stop hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(
            FailureReason::Dependency("core".into()).to_string(),
            "dependency 'core' did not start"
        );
        assert_eq!(
            FailureReason::Timeout(Duration::from_millis(1500)).to_string(),
            "hook timed out after 1.5s"
        );
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&PluginState::SkippedByDependency).unwrap();
        assert_eq!(json, "\"skipped_by_dependency\"");
    }

    #[test]
    fn test_start_report_failed_names() {
        let report = StartReport {
            started: vec!["core".into()],
            failures: vec![PluginFailure {
                plugin: "web".into(),
                reason: FailureReason::Hook("boom".into()),
            }],
        };
        assert_eq!(report.failed_names(), vec!["web"]);
        assert!(!report.is_clean());
    }
}
