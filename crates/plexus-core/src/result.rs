//! Convenience result type alias for Plexus.

use crate::error::AppError;

/// A specialized `Result` type for Plexus operations.
pub type AppResult<T> = Result<T, AppError>;
