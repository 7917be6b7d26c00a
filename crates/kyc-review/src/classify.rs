//! Static mapping from raw store errors to the classification taxonomy.
//!
//! Classification happens once, as close to the origin as possible; the
//! [`Classified`] record is what crosses the orchestrator boundary. Raw
//! errors with no table entry default to retryable `Unknown`, never to
//! `Validation`, so a possibly-recoverable failure is never discarded as a
//! client mistake.

use kyc_core::{Classified, ErrorCategory};
use kyc_store::StoreError;

/// Classify a raw store failure.
#[must_use]
pub fn classify(error: &StoreError) -> Classified {
    match error {
        StoreError::NotFound { entity, id } => {
            Classified::not_found(&format!("{entity} not found: {id}"))
        }

        StoreError::AlreadyExists { entity, .. } => Classified {
            category: ErrorCategory::Validation,
            error_code: "ALREADY_EXISTS",
            http_status: 409,
            user_message: format!("The {entity} already exists"),
            technical_message: error.to_string(),
            retryable: false,
        },

        StoreError::PreconditionFailed { .. } => Classified {
            category: ErrorCategory::Validation,
            error_code: "STATUS_CONFLICT",
            http_status: 409,
            user_message: "The document was already decided by another request".to_string(),
            technical_message: error.to_string(),
            retryable: false,
        },

        StoreError::InvalidPageToken(_) => Classified::validation("Invalid page token"),

        StoreError::Throttled(msg) => Classified {
            category: ErrorCategory::RateLimit,
            error_code: "RATE_LIMITED",
            http_status: 429,
            user_message: "The service is busy, please retry shortly".to_string(),
            technical_message: msg.clone(),
            retryable: true,
        },

        StoreError::Database(msg) => Classified {
            category: ErrorCategory::Transient,
            error_code: "STORE_UNAVAILABLE",
            http_status: 503,
            user_message: "The service is temporarily unavailable".to_string(),
            technical_message: msg.clone(),
            retryable: true,
        },

        // No table entry: conservative default, flagged distinctly
        StoreError::Serialization(msg) => Classified {
            category: ErrorCategory::Unknown,
            error_code: "UNKNOWN_STORE_ERROR",
            http_status: 500,
            user_message: "An unexpected error occurred".to_string(),
            technical_message: msg.clone(),
            retryable: true,
        },
    }
}
