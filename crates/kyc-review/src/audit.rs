//! Best-effort audit recording.
//!
//! Audit writes are never retried and never fail the caller: a review
//! decision must not be blocked because the trail could not be appended.
//! Failures are logged and counted instead.

use std::sync::Arc;

use kyc_core::AuditEntry;
use kyc_store::Store;

use crate::metrics::{metric, MetricsSink};

/// Appends audit entries, swallowing store failures.
#[derive(Clone)]
pub struct AuditPipeline {
    store: Arc<dyn Store>,
    metrics: Arc<dyn MetricsSink>,
}

impl AuditPipeline {
    /// Create a pipeline writing through `store`.
    pub fn new(store: Arc<dyn Store>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }

    /// Append `entry`. A failed append is logged and counted, never raised.
    pub fn record(&self, entry: AuditEntry) {
        let critical = entry.critical_error;
        if let Err(error) = self.store.append_audit(&entry) {
            self.metrics.incr(metric::AUDIT_RECORD_FAILED);
            tracing::warn!(
                action = %entry.action,
                resource_id = %entry.resource_id,
                critical,
                %error,
                "failed to append audit entry"
            );
        }
    }
}
