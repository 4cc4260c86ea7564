//! # plexus-api
//!
//! HTTP transport for Plexus built on Axum. Every inbound request is
//! adapted into a [`RequestStream`](plexus_pipeline::RequestStream) and
//! handed to the frozen [`Pipeline`](plexus_pipeline::Pipeline); the
//! router itself has no routes of its own.
//!
//! Also ships the built-in `core` plugin and the list of compiled-in
//! plugins the server starts with.

pub mod app;
pub mod builtin;
pub mod plugins;
pub mod stream;

pub use app::{build_app, run_server, serve, shutdown_signal};
pub use builtin::core_plugin;
pub use stream::AxumStream;
