//! End-to-end tests: configuration to plugins to pipeline to HTTP.

mod helpers;
mod lifecycle_test;
mod server_test;
mod static_test;
