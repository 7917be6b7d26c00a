//! Best-effort domain-event publication.
//!
//! Events are validated against their schema before send; an invalid event
//! is dropped and counted, never sent partially. Delivery failures are
//! logged and counted but never surfaced to the caller and never retried,
//! so a flaky bus cannot block a review decision.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kyc_core::DomainEvent;

use crate::metrics::{metric, MetricsSink};

/// Delivery failure reported by an [`EventBus`].
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The event never reached the bus.
    #[error("event transport failed: {0}")]
    Transport(String),

    /// The bus received the event and refused it.
    #[error("event rejected by bus with status {status}")]
    Rejected {
        /// HTTP status returned by the bus.
        status: u16,
    },
}

/// Transport seam for event delivery.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Deliver one event.
    async fn send(&self, event: &DomainEvent) -> Result<(), BusError>;
}

/// Bus that posts events as JSON to an HTTP endpoint.
pub struct HttpEventBus {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventBus {
    /// Create a bus posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the underlying client build error.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl EventBus for HttpEventBus {
    async fn send(&self, event: &DomainEvent) -> Result<(), BusError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BusError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}

/// Bus that drops every event, for deployments without a configured topic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn send(&self, _event: &DomainEvent) -> Result<(), BusError> {
        Ok(())
    }
}

/// Validates and publishes events, containing every failure.
#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    metrics: Arc<dyn MetricsSink>,
}

impl EventPublisher {
    /// Create a publisher delivering through `bus`.
    pub fn new(bus: Arc<dyn EventBus>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { bus, metrics }
    }

    /// Publish one event, best-effort.
    ///
    /// Schema-invalid events are dropped before send. Neither validation nor
    /// delivery failures propagate.
    pub async fn publish(&self, event: DomainEvent) {
        if let Err(violation) = event.validate() {
            self.metrics.incr(metric::EVENT_DROPPED_INVALID);
            tracing::warn!(
                event_type = event.event_type.as_str(),
                event_id = %event.event_id,
                %violation,
                "dropping schema-invalid event"
            );
            return;
        }

        match self.bus.send(&event).await {
            Ok(()) => {
                self.metrics.incr(metric::EVENT_PUBLISHED);
                tracing::debug!(
                    event_type = event.event_type.as_str(),
                    event_id = %event.event_id,
                    document_id = %event.document_id,
                    "event published"
                );
            }
            Err(error) => {
                self.metrics.incr(metric::EVENT_PUBLISH_FAILED);
                tracing::warn!(
                    event_type = event.event_type.as_str(),
                    event_id = %event.event_id,
                    %error,
                    "event publication failed"
                );
            }
        }
    }
}
