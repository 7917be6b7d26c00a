//! Domain events published to the pub/sub bus.
//!
//! Each event type carries a fixed, versioned payload schema. Events are
//! validated before send; a malformed event is dropped rather than sent
//! partially. Delivery is best-effort and never blocks the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocumentStatus, DocumentType};
use crate::ids::{DocumentId, UserId};

/// Fixed source tag stamped on every envelope.
pub const EVENT_SOURCE: &str = "kyc-backend";

/// Event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A document upload was confirmed complete.
    DocumentUploaded,

    /// A reviewer started working on a document.
    ReviewStarted,

    /// A review decision was committed.
    ReviewCompleted,

    /// A document moved between lifecycle statuses.
    DocumentStatusChanged,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocumentUploaded => "document.uploaded",
            Self::ReviewStarted => "review.started",
            Self::ReviewCompleted => "review.completed",
            Self::DocumentStatusChanged => "document.status_changed",
        }
    }

    /// Current schema version for this event type.
    #[must_use]
    pub const fn schema_version(self) -> u32 {
        1
    }
}

/// A versioned event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event id.
    pub event_id: Uuid,

    /// Event type discriminator.
    pub event_type: EventType,

    /// Schema version of the payload.
    pub schema_version: u32,

    /// Fixed source tag ([`EVENT_SOURCE`]).
    pub source: String,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// User the event concerns.
    pub user_id: UserId,

    /// Document the event concerns.
    pub document_id: DocumentId,

    /// Event-type-specific payload.
    pub payload: EventPayload,
}

/// Event-type-specific payload fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    /// Payload for `document.uploaded`.
    DocumentUploaded {
        /// Kind of document uploaded.
        document_type: DocumentType,
        /// Original filename.
        filename: String,
    },

    /// Payload for `review.started`.
    ReviewStarted {
        /// Reviewer that picked up the document.
        reviewer: String,
    },

    /// Payload for `review.completed`.
    ReviewCompleted {
        /// Terminal status the review produced.
        decision: DocumentStatus,
        /// Reviewer that made the decision.
        reviewer: String,
        /// Wall-clock processing time in milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        processing_ms: Option<u64>,
        /// Reviewer comments.
        #[serde(skip_serializing_if = "Option::is_none")]
        comments: Option<String>,
    },

    /// Payload for `document.status_changed`.
    StatusChanged {
        /// Status before the transition.
        previous_status: DocumentStatus,
        /// Status after the transition.
        new_status: DocumentStatus,
        /// Reviewer, when the transition was a decision.
        #[serde(skip_serializing_if = "Option::is_none")]
        reviewer: Option<String>,
    },
}

impl EventPayload {
    /// The event type this payload belongs to.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::DocumentUploaded { .. } => EventType::DocumentUploaded,
            Self::ReviewStarted { .. } => EventType::ReviewStarted,
            Self::ReviewCompleted { .. } => EventType::ReviewCompleted,
            Self::StatusChanged { .. } => EventType::DocumentStatusChanged,
        }
    }
}

/// A schema violation found during pre-send validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventValidationError {
    /// A required field is empty.
    #[error("event {event_type}: required field '{field}' is empty")]
    EmptyField {
        /// Wire name of the event type.
        event_type: &'static str,
        /// Name of the offending field.
        field: &'static str,
    },

    /// The payload does not match the envelope's event type.
    #[error("payload kind {payload} does not match event type {event_type}")]
    PayloadMismatch {
        /// Wire name of the envelope's event type.
        event_type: &'static str,
        /// Wire name of the payload's event type.
        payload: &'static str,
    },

    /// A status transition payload that does not describe a change.
    #[error("status_changed event with identical previous and new status: {status}")]
    NoStatusChange {
        /// The repeated status.
        status: DocumentStatus,
    },
}

impl DomainEvent {
    fn new(user_id: UserId, document_id: DocumentId, payload: EventPayload) -> Self {
        let event_type = payload.event_type();
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            schema_version: event_type.schema_version(),
            source: EVENT_SOURCE.to_string(),
            timestamp: Utc::now(),
            user_id,
            document_id,
            payload,
        }
    }

    /// Build a `document.uploaded` event.
    #[must_use]
    pub fn document_uploaded(
        user_id: UserId,
        document_id: DocumentId,
        document_type: DocumentType,
        filename: &str,
    ) -> Self {
        Self::new(
            user_id,
            document_id,
            EventPayload::DocumentUploaded {
                document_type,
                filename: filename.to_string(),
            },
        )
    }

    /// Build a `review.started` event.
    #[must_use]
    pub fn review_started(user_id: UserId, document_id: DocumentId, reviewer: &str) -> Self {
        Self::new(
            user_id,
            document_id,
            EventPayload::ReviewStarted {
                reviewer: reviewer.to_string(),
            },
        )
    }

    /// Build a `review.completed` event.
    #[must_use]
    pub fn review_completed(
        user_id: UserId,
        document_id: DocumentId,
        decision: DocumentStatus,
        reviewer: &str,
        processing_ms: Option<u64>,
        comments: Option<String>,
    ) -> Self {
        Self::new(
            user_id,
            document_id,
            EventPayload::ReviewCompleted {
                decision,
                reviewer: reviewer.to_string(),
                processing_ms,
                comments,
            },
        )
    }

    /// Build a `document.status_changed` event.
    #[must_use]
    pub fn status_changed(
        user_id: UserId,
        document_id: DocumentId,
        previous_status: DocumentStatus,
        new_status: DocumentStatus,
        reviewer: Option<&str>,
    ) -> Self {
        Self::new(
            user_id,
            document_id,
            EventPayload::StatusChanged {
                previous_status,
                new_status,
                reviewer: reviewer.map(String::from),
            },
        )
    }

    /// Validate the envelope against the event type's schema.
    ///
    /// # Errors
    ///
    /// Returns the first schema violation found.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        let declared = self.event_type.as_str();
        let actual = self.payload.event_type();
        if actual != self.event_type {
            return Err(EventValidationError::PayloadMismatch {
                event_type: declared,
                payload: actual.as_str(),
            });
        }

        match &self.payload {
            EventPayload::DocumentUploaded { filename, .. } => {
                if filename.trim().is_empty() {
                    return Err(EventValidationError::EmptyField {
                        event_type: declared,
                        field: "filename",
                    });
                }
            }
            EventPayload::ReviewStarted { reviewer }
            | EventPayload::ReviewCompleted { reviewer, .. } => {
                if reviewer.trim().is_empty() {
                    return Err(EventValidationError::EmptyField {
                        event_type: declared,
                        field: "reviewer",
                    });
                }
            }
            EventPayload::StatusChanged {
                previous_status,
                new_status,
                ..
            } => {
                if previous_status == new_status {
                    return Err(EventValidationError::NoStatusChange {
                        status: *new_status,
                    });
                }
            }
        }

        Ok(())
    }
}
