//! Core domain types for the KYC document review backend.
//!
//! This crate defines the entities the review engine operates on:
//!
//! - [`Document`] and its review lifecycle ([`DocumentStatus`])
//! - [`UserRecord`] with the aggregate [`KycStatus`]
//! - [`AuditEntry`] for the append-only audit trail
//! - [`DomainEvent`] envelopes published to the pub/sub bus
//! - The error-classification taxonomy ([`Classified`], [`ErrorCategory`])

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod classify;
pub mod document;
pub mod event;
pub mod ids;
pub mod user;

pub use audit::{AuditDetails, AuditEntry, AuditResult, CRITICAL_PREFIX};
pub use classify::{Classified, ErrorCategory};
pub use document::{Document, DocumentStatus, DocumentType};
pub use event::{DomainEvent, EventPayload, EventType, EventValidationError, EVENT_SOURCE};
pub use ids::{DocumentId, IdError, UserId};
pub use user::{KycStatus, UserRecord, UserType};
