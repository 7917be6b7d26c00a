//! Document types for the KYC backend.
//!
//! A [`Document`] is one uploaded artifact. Its status only ever advances
//! `uploaded -> pending_review -> {approved | rejected}`; the terminal states
//! are final for that document instance (resubmission creates a new document).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DocumentId, UserId};

/// An identity document uploaded for review.
///
/// The file bytes live in the object store; the record only carries the
/// locator (`storage_bucket` / `storage_key`) and review metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id (ULID, time-ordered).
    pub document_id: DocumentId,

    /// Owner of the document.
    pub user_id: UserId,

    /// Kind of identity document.
    pub document_type: DocumentType,

    /// Object-store bucket holding the file.
    pub storage_bucket: String,

    /// Object-store key of the file.
    pub storage_key: String,

    /// Filename as supplied at upload time.
    pub original_filename: String,

    /// Current lifecycle status.
    pub status: DocumentStatus,

    /// When the document record was created.
    pub uploaded_at: DateTime<Utc>,

    /// When the review decision was made. Set only on the transition into a
    /// terminal status.
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Reviewer that made the decision. Set only on the terminal transition.
    pub reviewed_by: Option<String>,

    /// Reviewer comments. Required for rejections.
    pub review_comments: Option<String>,
}

impl Document {
    /// Create a new document record in the `uploaded` state.
    #[must_use]
    pub fn new(
        user_id: UserId,
        document_type: DocumentType,
        storage_bucket: String,
        storage_key: String,
        original_filename: String,
    ) -> Self {
        Self {
            document_id: DocumentId::generate(),
            user_id,
            document_type,
            storage_bucket,
            storage_key,
            original_filename,
            status: DocumentStatus::Uploaded,
            uploaded_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
            review_comments: None,
        }
    }

    /// Whether the document is waiting for a review decision.
    #[must_use]
    pub fn is_awaiting_review(&self) -> bool {
        self.status == DocumentStatus::PendingReview
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Upload started; file transfer not yet confirmed.
    Uploaded,

    /// Upload confirmed; waiting for a reviewer.
    PendingReview,

    /// Approved by a reviewer. Terminal.
    Approved,

    /// Rejected by a reviewer. Terminal.
    Rejected,
}

impl DocumentStatus {
    /// All status values, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Uploaded,
        Self::PendingReview,
        Self::Approved,
        Self::Rejected,
    ];

    /// Stable snake_case name, used in index keys and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether this status is terminal for the document instance.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uploaded, Self::PendingReview)
                | (Self::PendingReview, Self::Approved | Self::Rejected)
        )
    }

    /// Parse a status from its snake_case name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(Self::Uploaded),
            "pending_review" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported identity document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Passport photo page.
    Passport,

    /// Driver's license, front and back.
    DriversLicense,

    /// Government-issued national id card.
    NationalId,

    /// Utility bill or bank statement proving address.
    ProofOfAddress,
}

impl DocumentType {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DriversLicense => "drivers_license",
            Self::NationalId => "national_id",
            Self::ProofOfAddress => "proof_of_address",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
