//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode, Options,
    WriteBatch,
};

use kyc_core::{
    AuditEntry, Document, DocumentId, DocumentStatus, KycStatus, UserId, UserRecord,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{DocumentPage, StatusMutation, Store};

/// RocksDB-backed storage implementation.
///
/// Conditional writes (`put_*_if_absent`, `update_document_status`,
/// `set_kyc_status`) serialize their check-and-set through an internal write
/// lock; reads and scans take no lock.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<rocksdb::MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read_document(&self, document_id: &DocumentId) -> Result<Option<Document>> {
        let cf = self.cf(cf::DOCUMENTS)?;
        let key = keys::document_key(document_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Document Operations
    // =========================================================================

    fn put_document_if_absent(&self, document: &Document) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.read_document(&document.document_id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "document",
                id: document.document_id.to_string(),
            });
        }

        let cf_docs = self.cf(cf::DOCUMENTS)?;
        let cf_index = self.cf(cf::DOCUMENTS_BY_STATUS)?;

        let doc_key = keys::document_key(&document.document_id);
        let index_key = keys::status_index_key(
            document.status,
            &document.uploaded_at,
            &document.document_id,
        );
        let value = Self::serialize(document)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_docs, &doc_key, &value);
        batch.put_cf(&cf_index, &index_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_document(&self, document_id: &DocumentId) -> Result<Option<Document>> {
        self.read_document(document_id)
    }

    fn update_document_status(
        &self,
        document_id: &DocumentId,
        expected: DocumentStatus,
        mutation: &StatusMutation,
    ) -> Result<Document> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut document =
            self.read_document(document_id)?
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

        let cf_docs = self.cf(cf::DOCUMENTS)?;
        let cf_index = self.cf(cf::DOCUMENTS_BY_STATUS)?;
        let doc_key = keys::document_key(document_id);
        let value = Self::serialize(&document)?;

        // Record and index move together or not at all
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_docs, &doc_key, &value);
        batch.delete_cf(&cf_index, &old_index_key);
        batch.put_cf(&cf_index, &new_index_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(document)
    }

    fn list_documents_by_status(
        &self,
        status: DocumentStatus,
        limit: usize,
        page_token: Option<&str>,
    ) -> Result<DocumentPage> {
        let cf_index = self.cf(cf::DOCUMENTS_BY_STATUS)?;
        let prefix = keys::status_index_prefix(status);

        let after = page_token.map(keys::decode_page_token).transpose()?;
        let start: &[u8] = after.as_deref().unwrap_or(&prefix);

        let iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(start, Direction::Forward));

        let mut page_keys: Vec<Vec<u8>> = Vec::new();
        let mut has_more = false;

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }
            // The token names the last key of the previous page
            if after.as_deref() == Some(key.as_ref()) {
                continue;
            }
            if page_keys.len() == limit {
                has_more = true;
                break;
            }
            page_keys.push(key.to_vec());
        }

        let mut documents = Vec::with_capacity(page_keys.len());
        for key in &page_keys {
            let document_id = keys::extract_document_id_from_index_key(key)?;
            if let Some(doc) = self.read_document(&document_id)? {
                documents.push(doc);
            }
        }

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
        let cf_index = self.cf(cf::DOCUMENTS_BY_STATUS)?;
        let prefix = keys::status_index_prefix(status);

        let iter = self
            .db
            .iterator_cf(&cf_index, IteratorMode::From(&prefix, Direction::Forward));

        let mut count = 0;
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            count += 1;
        }

        Ok(count)
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user_if_absent(&self, user: &UserRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.get_user(&user.user_id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "user",
                id: user.user_id.to_string(),
            });
        }

        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(&user.user_id);
        let value = Self::serialize(user)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn set_kyc_status(&self, user_id: &UserId, status: KycStatus) -> Result<UserRecord> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut user = self.get_user(user_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })?;

        user.kyc_status = status;
        user.updated_at = chrono::Utc::now();

        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);
        let value = Self::serialize(&user)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user)
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        let cf = self.cf(cf::AUDIT_LOG)?;
        let key = keys::audit_key(&entry.entry_id);
        let value = Self::serialize(entry)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let cf = self.cf(cf::AUDIT_LOG)?;

        // ULID keys are time-ordered, so reverse iteration yields newest first
        let iter = self.db.iterator_cf(&cf, IteratorMode::End);

        let mut entries = Vec::new();
        for item in iter {
            if entries.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            entries.push(Self::deserialize(&value)?);
        }

        Ok(entries)
    }
}
