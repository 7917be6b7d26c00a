//! Orchestrator error surface.

use kyc_core::Classified;

use crate::classify::classify;
use crate::retry::RetryError;

/// Failure of a review-engine operation, carrying its classification.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The request was malformed or violated a business rule.
    #[error("{0}")]
    Validation(String),

    /// The referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The system is in an inconsistent state that needs operator attention.
    #[error("{0}")]
    Critical(String),

    /// A store operation failed; the classification was produced at the
    /// call site.
    #[error("{}", .0.user_message)]
    Store(Classified),
}

impl ReviewError {
    /// The classification record for this failure.
    #[must_use]
    pub fn classified(&self) -> Classified {
        match self {
            Self::Validation(msg) => Classified::validation(msg),
            Self::NotFound(msg) => Classified::not_found(msg),
            Self::Critical(msg) => Classified::critical(msg),
            Self::Store(classified) => classified.clone(),
        }
    }
}

impl From<RetryError> for ReviewError {
    fn from(error: RetryError) -> Self {
        match error {
            RetryError::Aborted { source, .. } => Self::Store(classify(&source)),
            RetryError::Exhausted {
                label,
                attempts,
                total_delay_ms,
                source,
            } => {
                let mut classified = classify(&source);
                classified.technical_message = format!(
                    "{label} failed after {attempts} attempts ({total_delay_ms} ms of backoff): {}",
                    classified.technical_message
                );
                Self::Store(classified)
            }
        }
    }
}
