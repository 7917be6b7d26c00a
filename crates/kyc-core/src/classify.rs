//! Error-classification taxonomy.
//!
//! A raw store or service failure is classified once, close to its origin,
//! into a [`Classified`] record; the classification is what crosses the
//! orchestrator boundary, not the raw error.

use serde::{Deserialize, Serialize};

/// Primary error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Client supplied bad input or violated a state precondition. Never
    /// retried.
    Validation,

    /// The named resource does not exist. Never retried.
    ResourceNotFound,

    /// The collaborator is throttling. Retry with backoff.
    RateLimit,

    /// Network or service outage. Retry with backoff.
    Transient,

    /// A later step failed after an earlier step durably committed. Never
    /// retried automatically; always audited distinctly.
    Critical,

    /// Unrecognized failure. Treated as transient but flagged distinctly in
    /// logs so the mapping table can be extended.
    Unknown,
}

impl ErrorCategory {
    /// Stable snake_case name, used in audit details and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ResourceNotFound => "resource_not_found",
            Self::RateLimit => "rate_limit",
            Self::Transient => "transient",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a raw failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classified {
    /// Primary category.
    pub category: ErrorCategory,

    /// Stable error code for tracking, e.g. `STATUS_CONFLICT`.
    pub error_code: &'static str,

    /// HTTP-equivalent status code.
    pub http_status: u16,

    /// Message safe to return to the caller.
    pub user_message: String,

    /// Message for logs; never returned to the caller.
    pub technical_message: String,

    /// Whether the operation may be retried.
    pub retryable: bool,
}

impl Classified {
    /// Build a validation-class result (400, never retried).
    #[must_use]
    pub fn validation(message: &str) -> Self {
        Self {
            category: ErrorCategory::Validation,
            error_code: "VALIDATION_FAILED",
            http_status: 400,
            user_message: message.to_string(),
            technical_message: message.to_string(),
            retryable: false,
        }
    }

    /// Build a not-found result (404, never retried).
    #[must_use]
    pub fn not_found(message: &str) -> Self {
        Self {
            category: ErrorCategory::ResourceNotFound,
            error_code: "RESOURCE_NOT_FOUND",
            http_status: 404,
            user_message: message.to_string(),
            technical_message: message.to_string(),
            retryable: false,
        }
    }

    /// Build a critical-inconsistency result (500, never retried).
    #[must_use]
    pub fn critical(technical_message: &str) -> Self {
        Self {
            category: ErrorCategory::Critical,
            error_code: "CRITICAL_INCONSISTENCY",
            http_status: 500,
            user_message: "The request could not be completed; support has been notified"
                .to_string(),
            technical_message: technical_message.to_string(),
            retryable: false,
        }
    }
}
