//! # plexus-pipeline
//!
//! The request pipeline: an ordered chain of handlers, assembled once from
//! plugin-contributed factories, that every inbound request is threaded
//! through until one of them completes it.
//!
//! Each request gets a fresh [`RequestContext`] and [`ChainResult`], so
//! concurrent requests never observe each other. Handlers of one request run
//! strictly in chain order.

pub mod context;
pub mod handler;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod shared;
pub mod stream;
pub mod testing;

pub use bytes;
pub use http;

pub use context::RequestContext;
pub use handler::{ClosureFactory, ClosureHandler, Handler, HandlerFactory};
pub use outcome::{Outcome, ResponseBody};
pub use pipeline::{Pipeline, PipelineOptions, panic_message};
pub use report::{ChainResult, HandlerReport};
pub use shared::SharedState;
pub use stream::RequestStream;
