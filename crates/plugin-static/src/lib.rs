//! # plugin-static
//!
//! Serves files from a directory. The plugin depends on `core`, so its
//! handler runs after the core handlers and claims only requests that map
//! to an existing file under the configured root.

pub mod handler;
pub mod plugin;

pub use handler::StaticHandler;
pub use plugin::{STATIC_PLUGIN, static_plugin};
