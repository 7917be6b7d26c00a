//! Review and status-transition engine for the KYC backend.
//!
//! The [`ReviewOrchestrator`] is the only writer of document decisions and of
//! the user-level `kyc_status` aggregate. It drives four collaborators:
//!
//! - the [`kyc_store::Store`] behind a [`RetryPolicy`] (bounded exponential
//!   backoff with jitter; non-retryable errors abort immediately),
//! - the [`AuditPipeline`] (best-effort, never fails the caller),
//! - the [`EventPublisher`] (best-effort, schema-validated, at-most-once),
//! - a [`MetricsSink`] (fire-and-forget counters and timers).
//!
//! Consistency across the document record and the user aggregate is achieved
//! by ordered writes plus explicit compensation: if the user-status write
//! fails after the document decision committed, the orchestrator records a
//! critical-error audit entry, bumps a dedicated metric, and surfaces a
//! failure to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod classify;
pub mod error;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod retry;

pub use audit::AuditPipeline;
pub use classify::classify;
pub use error::ReviewError;
pub use events::{BusError, EventBus, EventPublisher, HttpEventBus, NullEventBus};
pub use metrics::{metric, MetricsSink, TracingMetrics};
pub use orchestrator::{
    ReviewDecision, ReviewOrchestrator, ReviewRequest, StatusSummary, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use retry::{RetryError, RetryPolicy};
