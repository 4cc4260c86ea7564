//! The terminal outcome taxonomy emitted for every request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of the response written for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// The method is outside the allow-set; no handler ran.
    NotAllowed,
    /// The chain was exhausted without any handler completing.
    NotFound,
    /// A handler failed or the request stream broke.
    Internal,
    /// A handler completed the request.
    Success,
}

impl OutcomeKind {
    /// Default HTTP status code for this outcome.
    pub fn default_status(self) -> u16 {
        match self {
            Self::NotAllowed => 405,
            Self::NotFound => 404,
            Self::Internal => 500,
            Self::Success => 200,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed => write!(f, "NOT_ALLOWED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Success => write!(f, "SUCCESS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for kind in [
            OutcomeKind::NotAllowed,
            OutcomeKind::NotFound,
            OutcomeKind::Internal,
            OutcomeKind::Success,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_default_status() {
        assert_eq!(OutcomeKind::NotAllowed.default_status(), 405);
        assert_eq!(OutcomeKind::Internal.default_status(), 500);
    }
}
