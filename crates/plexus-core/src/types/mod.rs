//! Core type definitions shared by the lifecycle and the request pipeline.

pub mod outcome;
pub mod response;

pub use outcome::OutcomeKind;
pub use response::{ErrorBody, ErrorDetail};
