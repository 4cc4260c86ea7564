//! # plexus-core
//!
//! Core crate for Plexus. Contains the unified error system, the
//! configuration schema, and the outcome taxonomy shared by the plugin
//! lifecycle and the request pipeline.
//!
//! This crate has **no** internal dependencies on other Plexus crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
