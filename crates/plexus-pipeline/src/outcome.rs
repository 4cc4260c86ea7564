//! Terminal outcomes of the pipeline.

use std::path::PathBuf;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use plexus_core::AppError;
use plexus_core::types::{ErrorBody, OutcomeKind};

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body.
    Empty,
    /// In-memory bytes.
    Bytes(Bytes),
    /// A file streamed by the transport.
    File(PathBuf),
}

/// What the pipeline decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The method is not in the allow-set.
    NotAllowed {
        /// The methods that would have been accepted.
        allowed: Vec<Method>,
    },
    /// No handler completed the request.
    NotFound,
    /// A handler failed, panicked, or the body could not be read.
    Internal {
        /// Top-level error message.
        message: String,
        /// Cause chain; empty unless traces are exposed.
        trace: Vec<String>,
    },
    /// A handler completed the request.
    Success {
        /// Response status.
        status: StatusCode,
        /// Merged response headers.
        headers: HeaderMap,
        /// Response body.
        body: ResponseBody,
    },
}

impl Outcome {
    /// Builds an internal outcome from an error.
    pub fn internal(error: &AppError, expose_trace: bool) -> Self {
        let ErrorBody { error } = ErrorBody::from_error(error, expose_trace);
        Self::Internal {
            message: error.message,
            trace: error.trace,
        }
    }

    /// The outcome category.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::NotAllowed { .. } => OutcomeKind::NotAllowed,
            Self::NotFound => OutcomeKind::NotFound,
            Self::Internal { .. } => OutcomeKind::Internal,
            Self::Success { .. } => OutcomeKind::Success,
        }
    }

    /// The response status written for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Success { status, .. } => *status,
        }
    }

    /// Returns `true` for a success outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_matches_kind_defaults() {
        let outcomes = [
            Outcome::NotAllowed { allowed: vec![Method::GET] },
            Outcome::NotFound,
            Outcome::internal(&AppError::handler("boom"), false),
        ];
        for outcome in outcomes {
            assert_eq!(outcome.status().as_u16(), outcome.kind().default_status());
        }
    }

    #[test]
    fn test_internal_hides_trace() {
        match Outcome::internal(&AppError::handler("boom"), false) {
            Outcome::Internal { message, trace } => {
                assert_eq!(message, "boom");
                assert!(trace.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
