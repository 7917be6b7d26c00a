//! Key encoding utilities for `RocksDB`.
//!
//! Primary records are keyed by raw id bytes. The status index uses a string
//! prefix per status followed by the upload timestamp and document id, so a
//! prefix scan lists documents of one status in upload order.

use chrono::{DateTime, Utc};
use kyc_core::{DocumentId, DocumentStatus, UserId};
use ulid::Ulid;

use crate::error::StoreError;

/// Prefix for status index keys.
pub const STATUS_INDEX_PREFIX: &str = "DOCUMENT_STATUS#";

/// Create a document key from a document ID.
#[must_use]
pub fn document_key(document_id: &DocumentId) -> Vec<u8> {
    document_id.to_bytes().to_vec()
}

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create an audit-log key from an entry ID.
#[must_use]
pub fn audit_key(entry_id: &Ulid) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a prefix for scanning all index entries of one status.
#[must_use]
pub fn status_index_prefix(status: DocumentStatus) -> Vec<u8> {
    format!("{STATUS_INDEX_PREFIX}{status}#").into_bytes()
}

/// Create a status index key.
///
/// Format: `DOCUMENT_STATUS#<status># || uploaded_at millis (8 bytes BE) ||
/// document_id (16 bytes)`.
///
/// The timestamp component keeps entries of one status in upload order; the
/// document id disambiguates equal timestamps.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn status_index_key(
    status: DocumentStatus,
    uploaded_at: &DateTime<Utc>,
    document_id: &DocumentId,
) -> Vec<u8> {
    let mut key = status_index_prefix(status);
    key.extend_from_slice(&(uploaded_at.timestamp_millis() as u64).to_be_bytes());
    key.extend_from_slice(&document_id.to_bytes());
    key
}

/// Extract the document ID from a status index key.
///
/// # Errors
///
/// Returns `Database` if the key is shorter than an id suffix.
pub fn extract_document_id_from_index_key(key: &[u8]) -> Result<DocumentId, StoreError> {
    if key.len() < 16 {
        return Err(StoreError::Database(format!(
            "malformed status index key ({} bytes)",
            key.len()
        )));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[key.len() - 16..]);
    DocumentId::from_bytes(bytes)
        .map_err(|_| StoreError::Database("malformed document id in index key".to_string()))
}

/// Encode a raw index key as an opaque continuation token.
#[must_use]
pub fn encode_page_token(key: &[u8]) -> String {
    hex::encode(key)
}

/// Decode an opaque continuation token back into a raw index key.
///
/// # Errors
///
/// Returns `InvalidPageToken` if the token is not valid hex.
pub fn decode_page_token(token: &str) -> Result<Vec<u8>, StoreError> {
    hex::decode(token).map_err(|_| StoreError::InvalidPageToken(token.to_string()))
}
