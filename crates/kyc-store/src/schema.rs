//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary document records, keyed by `document_id` (ULID).
    pub const DOCUMENTS: &str = "documents";

    /// Index: documents by status, keyed by
    /// `DOCUMENT_STATUS#<status>#<uploaded_at millis> || document_id`.
    /// Value is empty (index only).
    pub const DOCUMENTS_BY_STATUS: &str = "documents_by_status";

    /// User compliance records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Append-only audit entries, keyed by `entry_id` (ULID).
    pub const AUDIT_LOG: &str = "audit_log";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::DOCUMENTS,
        cf::DOCUMENTS_BY_STATUS,
        cf::USERS,
        cf::AUDIT_LOG,
    ]
}
