//! Per-request side channel for cross-handler communication.

use std::collections::HashMap;

use serde_json::Value;

/// Conventional keys written by the built-in handlers.
pub mod keys {
    /// Unique identifier assigned to the request (string).
    pub const REQUEST_ID: &str = "request_id";
    /// Root directory the static handler resolved the path against (string).
    pub const STATIC_FILE_ROOT: &str = "static_file_root";
}

/// Values shared between the handlers of a single request.
///
/// Earlier handlers publish values through
/// [`HandlerReport::share`](crate::HandlerReport::share); later handlers
/// read them through the typed getters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedState {
    values: HashMap<String, Value>,
}

impl SharedState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value under the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Merges additions, last write wins.
    pub fn extend(&mut self, additions: HashMap<String, Value>) {
        self.values.extend(additions);
    }

    /// Gets a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Gets a boolean value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    /// Gets an integer value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|v| v.as_i64())
    }

    /// Returns whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether nothing has been shared yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
