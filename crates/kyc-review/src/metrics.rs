//! Fire-and-forget metrics seam.
//!
//! Every failure and success path emits at least one counter; the sink must
//! never block or fail the caller.

use std::time::Duration;

/// Metric names emitted by the engine.
pub mod metric {
    /// A review was approved.
    pub const REVIEW_APPROVED: &str = "review.approved";
    /// A review was rejected.
    pub const REVIEW_REJECTED: &str = "review.rejected";
    /// A review request failed validation or a store operation.
    pub const REVIEW_FAILED: &str = "review.failed";
    /// Wall-clock review processing time.
    pub const REVIEW_DURATION: &str = "review.duration";
    /// The document decision committed but the user-status write failed.
    pub const CRITICAL_INCONSISTENCY: &str = "review.critical_inconsistency";
    /// A domain event was delivered to the bus.
    pub const EVENT_PUBLISHED: &str = "events.published";
    /// A domain event delivery attempt failed.
    pub const EVENT_PUBLISH_FAILED: &str = "events.publish_failed";
    /// A domain event failed schema validation and was dropped.
    pub const EVENT_DROPPED_INVALID: &str = "events.dropped_invalid";
    /// An audit entry could not be appended.
    pub const AUDIT_RECORD_FAILED: &str = "audit.record_failed";
    /// A document record was registered.
    pub const DOCUMENT_REGISTERED: &str = "documents.registered";
    /// A document upload was confirmed complete.
    pub const UPLOAD_CONFIRMED: &str = "documents.upload_confirmed";
    /// A user record was created.
    pub const USER_REGISTERED: &str = "users.registered";
}

/// Sink for named counters and timers.
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by one.
    fn incr(&self, name: &'static str);

    /// Record a timing sample.
    fn timing(&self, name: &'static str, elapsed: Duration);
}

/// Default sink that emits metrics as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn incr(&self, name: &'static str) {
        tracing::debug!(counter = name, "metric");
    }

    fn timing(&self, name: &'static str, elapsed: Duration) {
        tracing::debug!(
            timer = name,
            elapsed_ms = elapsed.as_millis() as u64,
            "metric"
        );
    }
}
