//! User compliance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentStatus;
use crate::ids::UserId;

/// A user's profile and aggregate compliance status.
///
/// `kyc_status` mirrors the status of the user's most recently decided
/// document; after creation it is written only by the review orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user id (from the identity layer).
    pub user_id: UserId,

    /// Contact email.
    pub email: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Individual or business customer.
    pub user_type: UserType,

    /// Aggregate compliance status.
    pub kyc_status: KycStatus,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new record with `kyc_status = not_started`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        email: String,
        first_name: String,
        last_name: String,
        user_type: UserType,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            first_name,
            last_name,
            user_type,
            kyc_status: KycStatus::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate KYC status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// No document submitted yet.
    NotStarted,

    /// A document is awaiting review.
    Pending,

    /// Most recent decision was an approval.
    Approved,

    /// Most recent decision was a rejection.
    Rejected,
}

impl KycStatus {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// The user-level status mirroring a document decision.
    ///
    /// Only terminal document statuses map to a decision; the non-terminal
    /// ones return `None`.
    #[must_use]
    pub const fn from_decision(status: DocumentStatus) -> Option<Self> {
        match status {
            DocumentStatus::Approved => Some(Self::Approved),
            DocumentStatus::Rejected => Some(Self::Rejected),
            DocumentStatus::Uploaded | DocumentStatus::PendingReview => None,
        }
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// A natural person.
    Individual,

    /// A company or other legal entity.
    Business,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_not_started() {
        let user = UserRecord::new(
            UserId::generate(),
            "a@example.com".into(),
            "Ada".into(),
            "Lovelace".into(),
            UserType::Individual,
        );
        assert_eq!(user.kyc_status, KycStatus::NotStarted);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn decision_mapping() {
        assert_eq!(
            KycStatus::from_decision(DocumentStatus::Approved),
            Some(KycStatus::Approved)
        );
        assert_eq!(
            KycStatus::from_decision(DocumentStatus::Rejected),
            Some(KycStatus::Rejected)
        );
        assert_eq!(KycStatus::from_decision(DocumentStatus::Uploaded), None);
        assert_eq!(
            KycStatus::from_decision(DocumentStatus::PendingReview),
            None
        );
    }
}
