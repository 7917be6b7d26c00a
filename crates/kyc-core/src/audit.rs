//! Append-only audit trail types.
//!
//! Every privileged action emits at least two entries: an attempt entry
//! before the state transition and an outcome entry after it. Entries are
//! never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Message prefix for critical-error audit entries.
///
/// A cross-record inconsistency (document decided, user aggregate stale) is
/// recorded with this prefix so log search can separate it from ordinary
/// failures.
pub const CRITICAL_PREFIX: &str = "CRITICAL:";

/// One audit entry for a privileged action attempt or outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry id (ULID, time-ordered).
    pub entry_id: Ulid,

    /// Authenticated principal that performed the action.
    pub actor: String,

    /// Stable action identifier, e.g. `admin_access`, `review_decision`.
    pub action: String,

    /// Identifier of the resource acted on.
    pub resource_id: String,

    /// Attempt, success, or failure.
    pub result: AuditResult,

    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,

    /// Whether this entry records a committed-then-failed inconsistency.
    pub critical_error: bool,

    /// Structured detail payload.
    pub details: AuditDetails,
}

/// Outcome recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    /// The action is about to be attempted.
    Attempt,

    /// The action completed successfully.
    Success,

    /// The action failed.
    Failure,
}

/// Structured details attached to an audit entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditDetails {
    /// Caller-correlatable request id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Wall-clock processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_ms: Option<u64>,

    /// Error category from the classifier, on failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<String>,

    /// Error message, on failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Document type, on successful reviews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,

    /// Original filename, on successful reviews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl AuditEntry {
    fn new(actor: &str, action: &str, resource_id: &str, result: AuditResult) -> Self {
        Self {
            entry_id: Ulid::new(),
            actor: actor.to_string(),
            action: action.to_string(),
            resource_id: resource_id.to_string(),
            result,
            timestamp: Utc::now(),
            critical_error: false,
            details: AuditDetails::default(),
        }
    }

    /// Build an attempt entry, recorded before the action runs.
    #[must_use]
    pub fn attempt(actor: &str, action: &str, resource_id: &str) -> Self {
        Self::new(actor, action, resource_id, AuditResult::Attempt)
    }

    /// Build a success outcome entry.
    #[must_use]
    pub fn success(actor: &str, action: &str, resource_id: &str) -> Self {
        Self::new(actor, action, resource_id, AuditResult::Success)
    }

    /// Build a failure outcome entry.
    #[must_use]
    pub fn failure(actor: &str, action: &str, resource_id: &str) -> Self {
        Self::new(actor, action, resource_id, AuditResult::Failure)
    }

    /// Build a critical-error entry; the message is stored with
    /// [`CRITICAL_PREFIX`] prepended.
    #[must_use]
    pub fn critical(actor: &str, action: &str, resource_id: &str, message: &str) -> Self {
        let mut entry = Self::new(actor, action, resource_id, AuditResult::Failure);
        entry.critical_error = true;
        entry.details.error_message = Some(format!("{CRITICAL_PREFIX} {message}"));
        entry
    }

    /// Attach a request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.details.request_id = Some(request_id.to_string());
        self
    }

    /// Attach processing time.
    #[must_use]
    pub fn with_processing_ms(mut self, ms: u64) -> Self {
        self.details.processing_ms = Some(ms);
        self
    }

    /// Attach an error category and message.
    #[must_use]
    pub fn with_error(mut self, category: &str, message: &str) -> Self {
        self.details.error_category = Some(category.to_string());
        self.details.error_message = Some(message.to_string());
        self
    }

    /// Attach document metadata.
    #[must_use]
    pub fn with_document_meta(mut self, document_type: &str, filename: &str) -> Self {
        self.details.document_type = Some(document_type.to_string());
        self.details.filename = Some(filename.to_string());
        self
    }
}
