//! Response body types.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Body written with an `INTERNAL` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error payload.
    pub error: ErrorDetail,
}

/// Message and cause chain of an internal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Top-level error message.
    pub message: String,
    /// Cause chain, outermost first. Empty unless traces are exposed.
    #[serde(default)]
    pub trace: Vec<String>,
}

impl ErrorBody {
    /// Builds the body for `error`, including the trace only when asked.
    pub fn from_error(error: &AppError, expose_trace: bool) -> Self {
        Self {
            error: ErrorDetail {
                message: error.message.clone(),
                trace: if expose_trace { error.trace() } else { Vec::new() },
            },
        }
    }
}
