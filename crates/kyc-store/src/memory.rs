//! In-memory `Store` implementation.
//!
//! Backs tests and property checks with the same key encoding and pagination
//! semantics as the `RocksDB` backend, so anything verified here holds for
//! both implementations.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use kyc_core::{
    AuditEntry, Document, DocumentId, DocumentStatus, KycStatus, UserId, UserRecord,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::{DocumentPage, StatusMutation, Store};

#[derive(Default)]
struct Inner {
    documents: HashMap<DocumentId, Document>,
    // Same index keys as the RocksDB backend, kept sorted
    status_index: BTreeMap<Vec<u8>, DocumentId>,
    users: HashMap<UserId, UserRecord>,
    audit: Vec<AuditEntry>,
}

/// In-memory storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn put_document_if_absent(&self, document: &Document) -> Result<()> {
        let mut inner = self.lock();
        if inner.documents.contains_key(&document.document_id) {
            return Err(StoreError::AlreadyExists {
                entity: "document",
                id: document.document_id.to_string(),
            });
        }

        let index_key = keys::status_index_key(
            document.status,
            &document.uploaded_at,
            &document.document_id,
        );
        inner.status_index.insert(index_key, document.document_id);
        inner
            .documents
            .insert(document.document_id, document.clone());
        Ok(())
    }

    fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>> {
        Ok(self.lock().documents.get(document_id).cloned())
    }

    fn update_document_status(
        &self,
        document_id: &DocumentId,
        expected: DocumentStatus,
        mutation: &StatusMutation,
    ) -> Result<Document> {
        let mut inner = self.lock();

        let mut document = inner
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "document",
                id: document_id.to_string(),
            })?;

        if document.status != expected {
            return Err(StoreError::PreconditionFailed {
                expected,
                actual: document.status,
            });
        }

        let old_index_key =
            keys::status_index_key(document.status, &document.uploaded_at, document_id);

        document.status = mutation.new_status;
        if mutation.reviewed_by.is_some() {
            document.reviewed_by.clone_from(&mutation.reviewed_by);
        }
        if mutation.reviewed_at.is_some() {
            document.reviewed_at = mutation.reviewed_at;
        }
        if mutation.review_comments.is_some() {
            document
                .review_comments
                .clone_from(&mutation.review_comments);
        }

        let new_index_key =
            keys::status_index_key(document.status, &document.uploaded_at, document_id);

        inner.status_index.remove(&old_index_key);
        inner.status_index.insert(new_index_key, *document_id);
        inner.documents.insert(*document_id, document.clone());

        Ok(document)
    }

    fn list_documents_by_status(
        &self,
        status: DocumentStatus,
        limit: usize,
        page_token: Option<&str>,
    ) -> Result<DocumentPage> {
        let after = page_token.map(keys::decode_page_token).transpose()?;
        let prefix = keys::status_index_prefix(status);

        let inner = self.lock();
        let mut page_keys: Vec<Vec<u8>> = Vec::new();
        let mut page_ids: Vec<DocumentId> = Vec::new();
        let mut has_more = false;

        let start: Vec<u8> = after.clone().unwrap_or_else(|| prefix.clone());
        for (key, id) in inner.status_index.range(start..) {
            if !key.starts_with(&prefix) {
                break;
            }
            if after.as_deref() == Some(key.as_slice()) {
                continue;
            }
            if page_keys.len() == limit {
                has_more = true;
                break;
            }
            page_keys.push(key.clone());
            page_ids.push(*id);
        }

        let documents = page_ids
            .iter()
            .filter_map(|id| inner.documents.get(id).cloned())
            .collect();

        let next_page_token = if has_more {
            page_keys.last().map(|k| keys::encode_page_token(k))
        } else {
            None
        };

        Ok(DocumentPage {
            documents,
            next_page_token,
        })
    }

    fn count_documents_by_status(&self, status: DocumentStatus) -> Result<usize> {
        let prefix = keys::status_index_prefix(status);
        let inner = self.lock();
        Ok(inner
            .status_index
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .count())
    }

    fn put_user_if_absent(&self, user: &UserRecord) -> Result<()> {
        let mut inner = self.lock();
        if inner.users.contains_key(&user.user_id) {
            return Err(StoreError::AlreadyExists {
                entity: "user",
                id: user.user_id.to_string(),
            });
        }
        inner.users.insert(user.user_id, user.clone());
        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        Ok(self.lock().users.get(user_id).cloned())
    }

    fn set_kyc_status(&self, user_id: &UserId, status: KycStatus) -> Result<UserRecord> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            })?;

        user.kyc_status = status;
        user.updated_at = chrono::Utc::now();
        Ok(user.clone())
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.lock().audit.push(entry.clone());
        Ok(())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let inner = self.lock();
        Ok(inner.audit.iter().rev().take(limit).cloned().collect())
    }
}
