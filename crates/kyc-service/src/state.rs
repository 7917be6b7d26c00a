//! Application state.

use std::sync::Arc;
use std::time::Duration;

use kyc_review::{
    EventBus, HttpEventBus, MetricsSink, NullEventBus, ReviewOrchestrator, RetryPolicy,
    TracingMetrics,
};
use kyc_store::Store;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The review engine.
    pub engine: ReviewOrchestrator,

    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let bus: Arc<dyn EventBus> = match &config.events_endpoint {
            Some(endpoint) => {
                match HttpEventBus::new(
                    endpoint,
                    Duration::from_secs(config.events_timeout_seconds),
                ) {
                    Ok(bus) => {
                        tracing::info!(endpoint = %endpoint, "event publication enabled");
                        Arc::new(bus)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to create event bus client");
                        Arc::new(NullEventBus)
                    }
                }
            }
            None => {
                tracing::warn!("no events endpoint configured, domain events will be dropped");
                Arc::new(NullEventBus)
            }
        };

        let metrics: Arc<dyn MetricsSink> = Arc::new(TracingMetrics);
        let engine =
            ReviewOrchestrator::new(store.clone(), bus, metrics, RetryPolicy::default());

        Self {
            engine,
            store,
            config,
        }
    }
}
