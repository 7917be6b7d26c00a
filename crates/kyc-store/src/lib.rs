//! Storage layer for the KYC document review backend.
//!
//! This crate provides persistent storage for documents, user compliance
//! records, and the audit log using `RocksDB` with column families, plus an
//! in-memory implementation of the same [`Store`] trait for tests.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `documents`: Primary document records, keyed by `document_id` (ULID)
//! - `documents_by_status`: Index for status-scoped listing, keyed by
//!   `DOCUMENT_STATUS#<status>#<uploaded_at> || document_id`
//! - `users`: User compliance records, keyed by `user_id`
//! - `audit_log`: Append-only audit entries, keyed by `entry_id` (ULID)
//!
//! The conditional status update is the sole concurrency-control primitive:
//! of two simultaneous decisions on one document, exactly one succeeds and
//! the other observes `PreconditionFailed`. Operations carry no retry logic
//! of their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};
use kyc_core::{
    AuditEntry, Document, DocumentId, DocumentStatus, KycStatus, UserId, UserRecord,
};

/// Fields written by a conditional status update.
///
/// The reviewer fields are set only on the transition into a terminal status;
/// a plain lifecycle transition (`uploaded -> pending_review`) leaves them
/// empty.
#[derive(Debug, Clone)]
pub struct StatusMutation {
    /// Status to move the document to.
    pub new_status: DocumentStatus,

    /// Reviewer making the decision.
    pub reviewed_by: Option<String>,

    /// Decision timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Reviewer comments.
    pub review_comments: Option<String>,
}

impl StatusMutation {
    /// A lifecycle transition with no reviewer metadata.
    #[must_use]
    pub fn transition(new_status: DocumentStatus) -> Self {
        Self {
            new_status,
            reviewed_by: None,
            reviewed_at: None,
            review_comments: None,
        }
    }

    /// A review decision stamped with reviewer, timestamp, and comments.
    #[must_use]
    pub fn decision(new_status: DocumentStatus, reviewer: &str, comments: Option<String>) -> Self {
        Self {
            new_status,
            reviewed_by: Some(reviewer.to_string()),
            reviewed_at: Some(Utc::now()),
            review_comments: comments,
        }
    }
}

/// One page of a status-scoped listing.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    /// Documents on this page, in upload order.
    pub documents: Vec<Document>,

    /// Opaque continuation token; `None` when the index is exhausted.
    pub next_page_token: Option<String>,
}

/// The storage trait defining all database operations.
///
/// This is an explicit capability interface: any implementation (`RocksDB`,
/// in-memory) satisfies the same contract, so the review engine and its tests
/// run against either.
pub trait Store: Send + Sync {
    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Insert a document record, failing if the id already exists.
    ///
    /// Also writes the status index entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the document id is taken.
    fn put_document_if_absent(&self, document: &Document) -> Result<()>;

    /// Get a document by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>>;

    /// Conditionally update a document's status.
    ///
    /// The update only succeeds if the stored status still equals `expected`;
    /// the record and its status index entry move atomically. Returns the
    /// updated document.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the document doesn't exist.
    /// - `StoreError::PreconditionFailed` if the stored status no longer
    ///   matches `expected`.
    fn update_document_status(
        &self,
        document_id: &DocumentId,
        expected: DocumentStatus,
        mutation: &StatusMutation,
    ) -> Result<Document>;

    /// List documents of one status in upload order, paged.
    ///
    /// `page_token` is the opaque token from a previous page; `limit` bounds
    /// the page size.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPageToken` for an undecodable token.
    fn list_documents_by_status(
        &self,
        status: DocumentStatus,
        limit: usize,
        page_token: Option<&str>,
    ) -> Result<DocumentPage>;

    /// Count documents of one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_documents_by_status(&self, status: DocumentStatus) -> Result<usize>;

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a user record, failing if the user already exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the user id is taken.
    fn put_user_if_absent(&self, user: &UserRecord) -> Result<()>;

    /// Get a user record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>>;

    /// Set a user's aggregate KYC status. Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn set_kyc_status(&self, user_id: &UserId, status: KycStatus) -> Result<UserRecord>;

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Append an audit entry. Entries are never mutated or deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_audit(&self, entry: &AuditEntry) -> Result<()>;

    /// List audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>>;
}
