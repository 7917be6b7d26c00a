//! The review orchestrator: sole writer of document decisions and of the
//! user-level `kyc_status` aggregate.
//!
//! A decision proceeds in a fixed order: validate the request, load and check
//! the document, commit the conditional document write, then mirror the
//! decision onto the user record. The conditional write is the concurrency
//! gate; everything after it is either best-effort (audit, events) or
//! compensated (the user-status write, which on failure produces a
//! critical-error audit entry rather than a rollback).

use std::sync::Arc;
use std::time::Instant;

use kyc_core::{
    AuditEntry, Document, DocumentId, DocumentStatus, DomainEvent, KycStatus, UserRecord,
};
use kyc_store::{DocumentPage, StatusMutation, Store};
use serde::Serialize;

use crate::audit::AuditPipeline;
use crate::error::ReviewError;
use crate::events::{EventBus, EventPublisher};
use crate::metrics::{metric, MetricsSink};
use crate::retry::RetryPolicy;

/// Audit action for privileged read access to review queues.
pub const ACTION_ADMIN_ACCESS: &str = "admin_access";

/// Audit action for a review decision.
pub const ACTION_REVIEW_DECISION: &str = "review_decision";

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard cap on a single listing page.
pub const MAX_PAGE_SIZE: usize = 100;

/// A reviewer's verdict on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Accept the document.
    Approve,

    /// Refuse the document. Requires comments.
    Reject,
}

impl ReviewDecision {
    /// The terminal document status this decision produces.
    #[must_use]
    pub const fn target_status(self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
        }
    }

    /// The user-level status mirroring this decision.
    #[must_use]
    pub const fn kyc_status(self) -> KycStatus {
        match self {
            Self::Approve => KycStatus::Approved,
            Self::Reject => KycStatus::Rejected,
        }
    }
}

/// One review-decision request.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// Authenticated reviewer making the decision.
    pub actor: String,

    /// Caller-correlatable request id, when supplied.
    pub request_id: Option<String>,

    /// Owner the document is expected to belong to.
    pub user_id: kyc_core::UserId,

    /// Document being decided.
    pub document_id: DocumentId,

    /// The verdict.
    pub decision: ReviewDecision,

    /// Reviewer comments. Required for rejections.
    pub comments: Option<String>,
}

/// Document counts per lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    /// Documents with an unconfirmed upload.
    pub uploaded: usize,

    /// Documents waiting for review.
    pub pending_review: usize,

    /// Approved documents.
    pub approved: usize,

    /// Rejected documents.
    pub rejected: usize,

    /// All documents.
    pub total: usize,
}

/// Drives the document lifecycle and the user aggregate.
#[derive(Clone)]
pub struct ReviewOrchestrator {
    store: Arc<dyn Store>,
    retry: RetryPolicy,
    audit: AuditPipeline,
    events: EventPublisher,
    metrics: Arc<dyn MetricsSink>,
}

impl ReviewOrchestrator {
    /// Assemble the orchestrator and its best-effort collaborators.
    pub fn new(
        store: Arc<dyn Store>,
        bus: Arc<dyn EventBus>,
        metrics: Arc<dyn MetricsSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            audit: AuditPipeline::new(store.clone(), metrics.clone()),
            events: EventPublisher::new(bus, metrics.clone()),
            store,
            retry,
            metrics,
        }
    }

    /// Create a user compliance record with `kyc_status = not_started`.
    ///
    /// # Errors
    ///
    /// Validation error if the user id is already taken.
    pub async fn register_user(&self, user: UserRecord) -> Result<UserRecord, ReviewError> {
        let record = user.clone();
        self.retry
            .execute("put_user_if_absent", move || {
                self.store.put_user_if_absent(&record)
            })
            .await?;

        self.metrics.incr(metric::USER_REGISTERED);
        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    /// Create a document record in the `uploaded` state.
    ///
    /// # Errors
    ///
    /// Not-found error if the owner does not exist; validation error if the
    /// document id is already taken.
    pub async fn register_document(&self, document: Document) -> Result<Document, ReviewError> {
        let user_id = document.user_id;
        let owner = self
            .retry
            .execute("get_user", move || self.store.get_user(&user_id))
            .await?;
        if owner.is_none() {
            return Err(ReviewError::NotFound(format!(
                "User not found: {user_id}"
            )));
        }

        let record = document.clone();
        self.retry
            .execute("put_document_if_absent", move || {
                self.store.put_document_if_absent(&record)
            })
            .await?;

        self.metrics.incr(metric::DOCUMENT_REGISTERED);
        tracing::info!(
            document_id = %document.document_id,
            user_id = %document.user_id,
            document_type = %document.document_type,
            "document registered"
        );
        Ok(document)
    }

    /// Confirm a finished upload: `uploaded -> pending_review`, mirror
    /// `pending` onto the user, publish `document.uploaded`.
    ///
    /// The user-status mirror here is a single best-effort attempt: a stale
    /// `not_started` self-heals on the next decision, unlike the terminal
    /// mirror in [`Self::decide`].
    ///
    /// # Errors
    ///
    /// Not-found error for an unknown document; validation error when the
    /// document is not in `uploaded`.
    pub async fn confirm_upload(&self, document_id: &DocumentId) -> Result<Document, ReviewError> {
        let id = *document_id;
        let document = self
            .retry
            .execute("update_document_status", move || {
                self.store.update_document_status(
                    &id,
                    DocumentStatus::Uploaded,
                    &StatusMutation::transition(DocumentStatus::PendingReview),
                )
            })
            .await?;

        if let Err(error) = self
            .store
            .set_kyc_status(&document.user_id, KycStatus::Pending)
        {
            tracing::warn!(
                user_id = %document.user_id,
                document_id = %document.document_id,
                %error,
                "failed to mirror pending status onto user"
            );
        }

        self.events
            .publish(DomainEvent::document_uploaded(
                document.user_id,
                document.document_id,
                document.document_type,
                &document.original_filename,
            ))
            .await;

        self.metrics.incr(metric::UPLOAD_CONFIRMED);
        tracing::info!(document_id = %document.document_id, "upload confirmed");
        Ok(document)
    }

    /// Apply a review decision.
    ///
    /// Ordering is load-bearing:
    ///
    /// 1. request validation (before any store access),
    /// 2. attempt audit + document load and checks,
    /// 3. conditional document write (`pending_review -> terminal`),
    /// 4. user-status mirror, with critical-error compensation on failure,
    /// 5. events, success audit, metrics.
    ///
    /// # Errors
    ///
    /// - Validation errors for missing rejection comments, a document not in
    ///   `pending_review`, an owner mismatch, or a lost conditional write.
    /// - Not-found error for an unknown document.
    /// - [`ReviewError::Critical`] when the document write committed but the
    ///   user-status write failed.
    pub async fn decide(&self, request: &ReviewRequest) -> Result<Document, ReviewError> {
        let started = Instant::now();
        let comments = request
            .comments
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);

        if request.decision == ReviewDecision::Reject && comments.is_none() {
            self.metrics.incr(metric::REVIEW_FAILED);
            return Err(ReviewError::Validation(
                "Comments are required for rejection".to_string(),
            ));
        }

        self.audit
            .record(self.stamp(AuditEntry::attempt(
                &request.actor,
                ACTION_ADMIN_ACCESS,
                &request.document_id.to_string(),
            ), request));

        let id = request.document_id;
        let document = self
            .retry
            .execute("get_document", move || self.store.get_document(&id))
            .await
            .map_err(|e| self.fail(request, ReviewError::from(e)))?;

        let Some(document) = document else {
            return Err(self.fail(
                request,
                ReviewError::NotFound(format!("Document not found: {id}")),
            ));
        };
        if !document.is_awaiting_review() {
            return Err(self.fail(
                request,
                ReviewError::Validation(format!(
                    "Document {id} is not awaiting review (status: {})",
                    document.status
                )),
            ));
        }
        if document.user_id != request.user_id {
            return Err(self.fail(
                request,
                ReviewError::Validation(format!(
                    "Document {id} does not belong to user {}",
                    request.user_id
                )),
            ));
        }

        self.events
            .publish(DomainEvent::review_started(
                document.user_id,
                document.document_id,
                &request.actor,
            ))
            .await;

        self.audit
            .record(self.stamp(AuditEntry::attempt(
                &request.actor,
                ACTION_REVIEW_DECISION,
                &request.document_id.to_string(),
            ), request));

        let target = request.decision.target_status();
        let mutation = StatusMutation::decision(target, &request.actor, comments.clone());
        let updated = self
            .retry
            .execute("update_document_status", move || {
                self.store
                    .update_document_status(&id, DocumentStatus::PendingReview, &mutation)
            })
            .await
            .map_err(|e| self.fail(request, ReviewError::from(e)))?;

        // The decision is durable from here on. A failure below must not be
        // reported as a plain error: the document and user records disagree.
        let kyc_status = request.decision.kyc_status();
        let user_id = updated.user_id;
        if let Err(error) = self
            .retry
            .execute("set_kyc_status", move || {
                self.store.set_kyc_status(&user_id, kyc_status)
            })
            .await
        {
            let message = format!(
                "document {id} decided as {target} but user {user_id} status update failed: {}",
                error.source_error()
            );
            self.metrics.incr(metric::CRITICAL_INCONSISTENCY);
            self.audit.record(self.stamp(
                AuditEntry::critical(
                    &request.actor,
                    ACTION_REVIEW_DECISION,
                    &request.document_id.to_string(),
                    &message,
                ),
                request,
            ));
            tracing::error!(
                document_id = %id,
                user_id = %user_id,
                decision = %target,
                error = %error,
                "user status update failed after document decision committed"
            );
            return Err(ReviewError::Critical(message));
        }

        let processing_ms = started.elapsed().as_millis() as u64;
        self.events
            .publish(DomainEvent::status_changed(
                updated.user_id,
                updated.document_id,
                DocumentStatus::PendingReview,
                target,
                Some(&request.actor),
            ))
            .await;
        self.events
            .publish(DomainEvent::review_completed(
                updated.user_id,
                updated.document_id,
                target,
                &request.actor,
                Some(processing_ms),
                comments,
            ))
            .await;

        self.audit.record(
            self.stamp(
                AuditEntry::success(
                    &request.actor,
                    ACTION_REVIEW_DECISION,
                    &request.document_id.to_string(),
                ),
                request,
            )
            .with_processing_ms(processing_ms)
            .with_document_meta(updated.document_type.as_str(), &updated.original_filename),
        );

        match request.decision {
            ReviewDecision::Approve => self.metrics.incr(metric::REVIEW_APPROVED),
            ReviewDecision::Reject => self.metrics.incr(metric::REVIEW_REJECTED),
        }
        self.metrics.timing(metric::REVIEW_DURATION, started.elapsed());
        tracing::info!(
            document_id = %id,
            user_id = %user_id,
            decision = %target,
            reviewer = %request.actor,
            processing_ms,
            "review decision committed"
        );

        Ok(updated)
    }

    /// Fetch one document.
    ///
    /// # Errors
    ///
    /// Not-found error for an unknown id.
    pub async fn get_document(&self, document_id: &DocumentId) -> Result<Document, ReviewError> {
        let id = *document_id;
        self.retry
            .execute("get_document", move || self.store.get_document(&id))
            .await?
            .ok_or_else(|| ReviewError::NotFound(format!("Document not found: {id}")))
    }

    /// Fetch one user record.
    ///
    /// # Errors
    ///
    /// Not-found error for an unknown id.
    pub async fn get_user(&self, user_id: &kyc_core::UserId) -> Result<UserRecord, ReviewError> {
        let id = *user_id;
        self.retry
            .execute("get_user", move || self.store.get_user(&id))
            .await?
            .ok_or_else(|| ReviewError::NotFound(format!("User not found: {id}")))
    }

    /// List documents of one status, paged, recording privileged access.
    ///
    /// `limit` is clamped to `1..=MAX_PAGE_SIZE`, defaulting to
    /// [`DEFAULT_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Validation error for an undecodable page token.
    pub async fn list_by_status(
        &self,
        actor: &str,
        status: DocumentStatus,
        limit: Option<usize>,
        page_token: Option<String>,
    ) -> Result<DocumentPage, ReviewError> {
        self.audit.record(AuditEntry::success(
            actor,
            ACTION_ADMIN_ACCESS,
            status.as_str(),
        ));

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.retry
            .execute("list_documents_by_status", move || {
                self.store
                    .list_documents_by_status(status, limit, page_token.as_deref())
            })
            .await
            .map_err(Into::into)
    }

    /// List the review queue: documents in `pending_review`, paged.
    ///
    /// # Errors
    ///
    /// Validation error for an undecodable page token.
    pub async fn pending(
        &self,
        actor: &str,
        limit: Option<usize>,
        page_token: Option<String>,
    ) -> Result<DocumentPage, ReviewError> {
        self.list_by_status(actor, DocumentStatus::PendingReview, limit, page_token)
            .await
    }

    /// Count documents per lifecycle status.
    ///
    /// # Errors
    ///
    /// Transient store errors after retry exhaustion.
    pub async fn status_summary(&self, actor: &str) -> Result<StatusSummary, ReviewError> {
        self.audit
            .record(AuditEntry::success(actor, ACTION_ADMIN_ACCESS, "summary"));

        let mut counts = [0usize; 4];
        for (slot, status) in counts.iter_mut().zip(DocumentStatus::ALL) {
            *slot = self
                .retry
                .execute("count_documents_by_status", move || {
                    self.store.count_documents_by_status(status)
                })
                .await?;
        }
        let [uploaded, pending_review, approved, rejected] = counts;
        Ok(StatusSummary {
            uploaded,
            pending_review,
            approved,
            rejected,
            total: uploaded + pending_review + approved + rejected,
        })
    }

    /// Recent audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Transient store errors after retry exhaustion.
    pub async fn recent_audit(
        &self,
        actor: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AuditEntry>, ReviewError> {
        self.audit
            .record(AuditEntry::success(actor, ACTION_ADMIN_ACCESS, "audit_log"));

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        self.retry
            .execute("list_audit", move || self.store.list_audit(limit))
            .await
            .map_err(Into::into)
    }

    fn stamp(&self, entry: AuditEntry, request: &ReviewRequest) -> AuditEntry {
        match &request.request_id {
            Some(request_id) => entry.with_request_id(request_id),
            None => entry,
        }
    }

    fn fail(&self, request: &ReviewRequest, error: ReviewError) -> ReviewError {
        let classified = error.classified();
        self.metrics.incr(metric::REVIEW_FAILED);
        self.audit.record(
            self.stamp(
                AuditEntry::failure(
                    &request.actor,
                    ACTION_REVIEW_DECISION,
                    &request.document_id.to_string(),
                ),
                request,
            )
            .with_error(classified.category.as_str(), &classified.technical_message),
        );
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BusError;
    use async_trait::async_trait;
    use kyc_core::{AuditResult, DocumentType, EventType, UserId, UserType};
    use kyc_store::{MemoryStore, StoreError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingMetrics(Mutex<Vec<&'static str>>);

    impl RecordingMetrics {
        fn count(&self, name: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|n| **n == name).count()
        }
    }

    impl MetricsSink for RecordingMetrics {
        fn incr(&self, name: &'static str) {
            self.0.lock().unwrap().push(name);
        }
        fn timing(&self, name: &'static str, _: Duration) {
            self.0.lock().unwrap().push(name);
        }
    }

    #[derive(Default)]
    struct RecordingBus(Mutex<Vec<DomainEvent>>);

    impl RecordingBus {
        fn types(&self) -> Vec<EventType> {
            self.0.lock().unwrap().iter().map(|e| e.event_type).collect()
        }
    }

    #[async_trait]
    impl EventBus for RecordingBus {
        async fn send(&self, event: &DomainEvent) -> Result<(), BusError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingBus;

    #[async_trait]
    impl EventBus for FailingBus {
        async fn send(&self, _: &DomainEvent) -> Result<(), BusError> {
            Err(BusError::Transport("bus offline".into()))
        }
    }

    /// Counts every store invocation; used to prove validation short-circuits.
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicU32,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                calls: AtomicU32::new(0),
            }
        }
        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Store for CountingStore {
        fn put_document_if_absent(&self, d: &Document) -> kyc_store::Result<()> {
            self.tick();
            self.inner.put_document_if_absent(d)
        }
        fn get_document(&self, id: &DocumentId) -> kyc_store::Result<Option<Document>> {
            self.tick();
            self.inner.get_document(id)
        }
        fn update_document_status(
            &self,
            id: &DocumentId,
            expected: DocumentStatus,
            mutation: &StatusMutation,
        ) -> kyc_store::Result<Document> {
            self.tick();
            self.inner.update_document_status(id, expected, mutation)
        }
        fn list_documents_by_status(
            &self,
            status: DocumentStatus,
            limit: usize,
            token: Option<&str>,
        ) -> kyc_store::Result<DocumentPage> {
            self.tick();
            self.inner.list_documents_by_status(status, limit, token)
        }
        fn count_documents_by_status(&self, status: DocumentStatus) -> kyc_store::Result<usize> {
            self.tick();
            self.inner.count_documents_by_status(status)
        }
        fn put_user_if_absent(&self, u: &UserRecord) -> kyc_store::Result<()> {
            self.tick();
            self.inner.put_user_if_absent(u)
        }
        fn get_user(&self, id: &UserId) -> kyc_store::Result<Option<UserRecord>> {
            self.tick();
            self.inner.get_user(id)
        }
        fn set_kyc_status(&self, id: &UserId, status: KycStatus) -> kyc_store::Result<UserRecord> {
            self.tick();
            self.inner.set_kyc_status(id, status)
        }
        fn append_audit(&self, e: &AuditEntry) -> kyc_store::Result<()> {
            self.tick();
            self.inner.append_audit(e)
        }
        fn list_audit(&self, limit: usize) -> kyc_store::Result<Vec<AuditEntry>> {
            self.tick();
            self.inner.list_audit(limit)
        }
    }

    /// Store whose user-status writes always fail; everything else delegates.
    struct BrokenUserStore(MemoryStore);

    impl Store for BrokenUserStore {
        fn put_document_if_absent(&self, d: &Document) -> kyc_store::Result<()> {
            self.0.put_document_if_absent(d)
        }
        fn get_document(&self, id: &DocumentId) -> kyc_store::Result<Option<Document>> {
            self.0.get_document(id)
        }
        fn update_document_status(
            &self,
            id: &DocumentId,
            expected: DocumentStatus,
            mutation: &StatusMutation,
        ) -> kyc_store::Result<Document> {
            self.0.update_document_status(id, expected, mutation)
        }
        fn list_documents_by_status(
            &self,
            status: DocumentStatus,
            limit: usize,
            token: Option<&str>,
        ) -> kyc_store::Result<DocumentPage> {
            self.0.list_documents_by_status(status, limit, token)
        }
        fn count_documents_by_status(&self, status: DocumentStatus) -> kyc_store::Result<usize> {
            self.0.count_documents_by_status(status)
        }
        fn put_user_if_absent(&self, u: &UserRecord) -> kyc_store::Result<()> {
            self.0.put_user_if_absent(u)
        }
        fn get_user(&self, id: &UserId) -> kyc_store::Result<Option<UserRecord>> {
            self.0.get_user(id)
        }
        fn set_kyc_status(&self, _: &UserId, _: KycStatus) -> kyc_store::Result<UserRecord> {
            Err(StoreError::Database("users partition offline".into()))
        }
        fn append_audit(&self, e: &AuditEntry) -> kyc_store::Result<()> {
            self.0.append_audit(e)
        }
        fn list_audit(&self, limit: usize) -> kyc_store::Result<Vec<AuditEntry>> {
            self.0.list_audit(limit)
        }
    }

    /// Store whose audit appends always fail; everything else delegates.
    struct BrokenAuditStore(MemoryStore);

    impl Store for BrokenAuditStore {
        fn put_document_if_absent(&self, d: &Document) -> kyc_store::Result<()> {
            self.0.put_document_if_absent(d)
        }
        fn get_document(&self, id: &DocumentId) -> kyc_store::Result<Option<Document>> {
            self.0.get_document(id)
        }
        fn update_document_status(
            &self,
            id: &DocumentId,
            expected: DocumentStatus,
            mutation: &StatusMutation,
        ) -> kyc_store::Result<Document> {
            self.0.update_document_status(id, expected, mutation)
        }
        fn list_documents_by_status(
            &self,
            status: DocumentStatus,
            limit: usize,
            token: Option<&str>,
        ) -> kyc_store::Result<DocumentPage> {
            self.0.list_documents_by_status(status, limit, token)
        }
        fn count_documents_by_status(&self, status: DocumentStatus) -> kyc_store::Result<usize> {
            self.0.count_documents_by_status(status)
        }
        fn put_user_if_absent(&self, u: &UserRecord) -> kyc_store::Result<()> {
            self.0.put_user_if_absent(u)
        }
        fn get_user(&self, id: &UserId) -> kyc_store::Result<Option<UserRecord>> {
            self.0.get_user(id)
        }
        fn set_kyc_status(&self, id: &UserId, status: KycStatus) -> kyc_store::Result<UserRecord> {
            self.0.set_kyc_status(id, status)
        }
        fn append_audit(&self, _: &AuditEntry) -> kyc_store::Result<()> {
            Err(StoreError::Database("audit partition offline".into()))
        }
        fn list_audit(&self, limit: usize) -> kyc_store::Result<Vec<AuditEntry>> {
            self.0.list_audit(limit)
        }
    }

    /// Store that parks conditional status writes on a barrier so two
    /// racing decisions both read `pending_review` before either commits.
    struct ContendedStore {
        inner: MemoryStore,
        gate: Barrier,
    }

    impl ContendedStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                gate: Barrier::new(2),
            }
        }
    }

    impl Store for ContendedStore {
        fn put_document_if_absent(&self, d: &Document) -> kyc_store::Result<()> {
            self.inner.put_document_if_absent(d)
        }
        fn get_document(&self, id: &DocumentId) -> kyc_store::Result<Option<Document>> {
            self.inner.get_document(id)
        }
        fn update_document_status(
            &self,
            id: &DocumentId,
            expected: DocumentStatus,
            mutation: &StatusMutation,
        ) -> kyc_store::Result<Document> {
            self.gate.wait();
            self.inner.update_document_status(id, expected, mutation)
        }
        fn list_documents_by_status(
            &self,
            status: DocumentStatus,
            limit: usize,
            token: Option<&str>,
        ) -> kyc_store::Result<DocumentPage> {
            self.inner.list_documents_by_status(status, limit, token)
        }
        fn count_documents_by_status(&self, status: DocumentStatus) -> kyc_store::Result<usize> {
            self.inner.count_documents_by_status(status)
        }
        fn put_user_if_absent(&self, u: &UserRecord) -> kyc_store::Result<()> {
            self.inner.put_user_if_absent(u)
        }
        fn get_user(&self, id: &UserId) -> kyc_store::Result<Option<UserRecord>> {
            self.inner.get_user(id)
        }
        fn set_kyc_status(&self, id: &UserId, status: KycStatus) -> kyc_store::Result<UserRecord> {
            self.inner.set_kyc_status(id, status)
        }
        fn append_audit(&self, e: &AuditEntry) -> kyc_store::Result<()> {
            self.inner.append_audit(e)
        }
        fn list_audit(&self, limit: usize) -> kyc_store::Result<Vec<AuditEntry>> {
            self.inner.list_audit(limit)
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(
            2,
            Duration::from_millis(1),
            Duration::from_millis(2),
            2.0,
            0.0,
        )
    }

    struct Harness {
        engine: ReviewOrchestrator,
        store: Arc<dyn Store>,
        bus: Arc<RecordingBus>,
        metrics: Arc<RecordingMetrics>,
    }

    fn harness_with(store: Arc<dyn Store>) -> Harness {
        let bus = Arc::new(RecordingBus::default());
        let metrics = Arc::new(RecordingMetrics::default());
        let engine = ReviewOrchestrator::new(
            store.clone(),
            bus.clone(),
            metrics.clone(),
            fast_retry(),
        );
        Harness {
            engine,
            store,
            bus,
            metrics,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MemoryStore::new()))
    }

    fn sample_user() -> UserRecord {
        UserRecord::new(
            UserId::generate(),
            "ada@example.com".into(),
            "Ada".into(),
            "Lovelace".into(),
            UserType::Individual,
        )
    }

    fn sample_document(user_id: UserId) -> Document {
        Document::new(
            user_id,
            DocumentType::Passport,
            "kyc-uploads".into(),
            format!("{user_id}/passport.pdf"),
            "passport.pdf".into(),
        )
    }

    /// Seed a user with one document already in `pending_review`.
    fn seed_pending(store: &dyn Store) -> (UserId, DocumentId) {
        let user = sample_user();
        store.put_user_if_absent(&user).unwrap();
        let doc = sample_document(user.user_id);
        store.put_document_if_absent(&doc).unwrap();
        store
            .update_document_status(
                &doc.document_id,
                DocumentStatus::Uploaded,
                &StatusMutation::transition(DocumentStatus::PendingReview),
            )
            .unwrap();
        store
            .set_kyc_status(&user.user_id, KycStatus::Pending)
            .unwrap();
        (user.user_id, doc.document_id)
    }

    fn request(
        user_id: UserId,
        document_id: DocumentId,
        decision: ReviewDecision,
        comments: Option<&str>,
    ) -> ReviewRequest {
        ReviewRequest {
            actor: "reviewer-1".into(),
            request_id: Some("req-1".into()),
            user_id,
            document_id,
            decision,
            comments: comments.map(String::from),
        }
    }

    #[tokio::test]
    async fn approval_updates_document_and_user() {
        let h = harness();
        let (user_id, doc_id) = seed_pending(h.store.as_ref());

        let updated = h
            .engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Approved);
        assert_eq!(updated.reviewed_by.as_deref(), Some("reviewer-1"));
        assert!(updated.reviewed_at.is_some());

        let user = h.store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.kyc_status, KycStatus::Approved);

        assert_eq!(h.metrics.count(metric::REVIEW_APPROVED), 1);
        assert_eq!(h.metrics.count(metric::REVIEW_DURATION), 1);
        assert_eq!(
            h.bus.types(),
            vec![
                EventType::ReviewStarted,
                EventType::DocumentStatusChanged,
                EventType::ReviewCompleted,
            ]
        );
    }

    #[tokio::test]
    async fn rejection_stores_comments_and_mirrors_user() {
        let h = harness();
        let (user_id, doc_id) = seed_pending(h.store.as_ref());

        let updated = h
            .engine
            .decide(&request(
                user_id,
                doc_id,
                ReviewDecision::Reject,
                Some("photo is blurry"),
            ))
            .await
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Rejected);
        assert_eq!(updated.review_comments.as_deref(), Some("photo is blurry"));
        let user = h.store.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.kyc_status, KycStatus::Rejected);
        assert_eq!(h.metrics.count(metric::REVIEW_REJECTED), 1);
    }

    #[tokio::test]
    async fn rejection_without_comments_touches_nothing() {
        let store = Arc::new(CountingStore::new());
        let (user_id, doc_id) = seed_pending(store.as_ref());
        store.calls.store(0, Ordering::SeqCst);

        let h = harness_with(store.clone());
        for comments in [None, Some("   ")] {
            let err = h
                .engine
                .decide(&request(user_id, doc_id, ReviewDecision::Reject, comments))
                .await
                .unwrap_err();
            assert!(matches!(err, ReviewError::Validation(_)));
            assert_eq!(err.classified().http_status, 400);
        }

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.metrics.count(metric::REVIEW_FAILED), 2);
        assert!(h.bus.types().is_empty());
    }

    #[tokio::test]
    async fn unknown_document_is_not_found_and_audited() {
        let h = harness();
        let (user_id, _) = seed_pending(h.store.as_ref());

        let err = h
            .engine
            .decide(&request(
                user_id,
                DocumentId::generate(),
                ReviewDecision::Approve,
                None,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::NotFound(_)));
        assert_eq!(err.classified().http_status, 404);

        let entries = h.store.list_audit(10).unwrap();
        let failure = entries
            .iter()
            .find(|e| e.result == AuditResult::Failure)
            .unwrap();
        assert_eq!(failure.action, ACTION_REVIEW_DECISION);
        assert_eq!(
            failure.details.error_category.as_deref(),
            Some("resource_not_found")
        );
    }

    #[tokio::test]
    async fn decided_document_cannot_be_decided_again() {
        let h = harness();
        let (user_id, doc_id) = seed_pending(h.store.as_ref());
        h.engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap();

        let err = h
            .engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap_err();

        let c = err.classified();
        assert_eq!(c.http_status, 400);
        assert!(c.user_message.contains("not awaiting review"));
    }

    #[tokio::test]
    async fn owner_mismatch_is_rejected() {
        let h = harness();
        let (_, doc_id) = seed_pending(h.store.as_ref());

        let err = h
            .engine
            .decide(&request(
                UserId::generate(),
                doc_id,
                ReviewDecision::Approve,
                None,
            ))
            .await
            .unwrap_err();

        let c = err.classified();
        assert_eq!(c.category, kyc_core::ErrorCategory::Validation);
        assert!(c.user_message.contains("does not belong"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_decisions_commit_exactly_once() {
        // Seed before wrapping so setup never trips the barrier.
        let inner = MemoryStore::new();
        let (user_id, doc_id) = seed_pending(&inner);
        let h = harness_with(Arc::new(ContendedStore::new(inner)));

        let approve = request(user_id, doc_id, ReviewDecision::Approve, None);
        let reject = request(user_id, doc_id, ReviewDecision::Reject, Some("mismatch"));
        let first = {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.decide(&approve).await })
        };
        let second = {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.decide(&reject).await })
        };
        let a = first.await.unwrap();
        let b = second.await.unwrap();

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        let c = loser.unwrap_err().classified();
        assert_eq!(c.error_code, "STATUS_CONFLICT");
        assert_eq!(c.http_status, 409);

        // The surviving decision fully mirrored onto the user
        let doc = h.store.get_document(&doc_id).unwrap().unwrap();
        let user = h.store.get_user(&user_id).unwrap().unwrap();
        assert!(doc.status.is_terminal());
        assert_eq!(
            user.kyc_status,
            KycStatus::from_decision(doc.status).unwrap()
        );
    }

    #[tokio::test]
    async fn failed_user_mirror_is_critical_and_audited() {
        let inner = MemoryStore::new();
        let (user_id, doc_id) = seed_pending(&inner);
        let h = harness_with(Arc::new(BrokenUserStore(inner)));

        let err = h
            .engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::Critical(_)));
        assert_eq!(err.classified().http_status, 500);
        assert_eq!(h.metrics.count(metric::CRITICAL_INCONSISTENCY), 1);

        // The document decision stayed committed
        let doc = h.store.get_document(&doc_id).unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::Approved);

        let entries = h.store.list_audit(10).unwrap();
        let critical = entries.iter().find(|e| e.critical_error).unwrap();
        assert_eq!(critical.result, AuditResult::Failure);
        let message = critical.details.error_message.as_deref().unwrap();
        assert!(message.starts_with(kyc_core::CRITICAL_PREFIX));
        assert!(message.contains("status update failed"));
    }

    #[tokio::test]
    async fn bus_outage_does_not_fail_the_decision() {
        let store = Arc::new(MemoryStore::new());
        let (user_id, doc_id) = seed_pending(store.as_ref());
        let metrics = Arc::new(RecordingMetrics::default());
        let engine = ReviewOrchestrator::new(
            store.clone(),
            Arc::new(FailingBus),
            metrics.clone(),
            fast_retry(),
        );

        let updated = engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Approved);
        assert_eq!(metrics.count(metric::EVENT_PUBLISH_FAILED), 3);
        assert_eq!(metrics.count(metric::REVIEW_APPROVED), 1);
    }

    #[tokio::test]
    async fn audit_outage_does_not_fail_the_decision() {
        let inner = MemoryStore::new();
        let (user_id, doc_id) = seed_pending(&inner);
        let h = harness_with(Arc::new(BrokenAuditStore(inner)));

        let updated = h
            .engine
            .decide(&request(user_id, doc_id, ReviewDecision::Approve, None))
            .await
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Approved);
        assert_eq!(h.metrics.count(metric::REVIEW_APPROVED), 1);
        // Each swallowed append is counted
        assert!(h.metrics.count(metric::AUDIT_RECORD_FAILED) >= 3);
    }

    #[tokio::test]
    async fn confirm_upload_moves_to_pending_and_publishes() {
        let h = harness();
        let user = sample_user();
        h.engine.register_user(user.clone()).await.unwrap();
        let doc = h
            .engine
            .register_document(sample_document(user.user_id))
            .await
            .unwrap();

        let confirmed = h.engine.confirm_upload(&doc.document_id).await.unwrap();

        assert_eq!(confirmed.status, DocumentStatus::PendingReview);
        let stored_user = h.store.get_user(&user.user_id).unwrap().unwrap();
        assert_eq!(stored_user.kyc_status, KycStatus::Pending);
        assert_eq!(h.bus.types(), vec![EventType::DocumentUploaded]);
        assert_eq!(h.metrics.count(metric::UPLOAD_CONFIRMED), 1);

        // Confirming twice is a lifecycle violation
        let err = h.engine.confirm_upload(&doc.document_id).await.unwrap_err();
        assert_eq!(err.classified().error_code, "STATUS_CONFLICT");
    }

    #[tokio::test]
    async fn register_document_requires_existing_user() {
        let h = harness();
        let err = h
            .engine
            .register_document(sample_document(UserId::generate()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_user_registration_is_a_conflict() {
        let h = harness();
        let user = sample_user();
        h.engine.register_user(user.clone()).await.unwrap();
        let err = h.engine.register_user(user).await.unwrap_err();
        assert_eq!(err.classified().error_code, "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn summary_counts_every_status() {
        let h = harness();
        let user = sample_user();
        h.engine.register_user(user.clone()).await.unwrap();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let doc = h
                .engine
                .register_document(sample_document(user.user_id))
                .await
                .unwrap();
            ids.push(doc.document_id);
        }
        h.engine.confirm_upload(&ids[0]).await.unwrap();
        h.engine.confirm_upload(&ids[1]).await.unwrap();
        h.engine
            .decide(&request(user.user_id, ids[0], ReviewDecision::Approve, None))
            .await
            .unwrap();

        let summary = h.engine.status_summary("admin-1").await.unwrap();
        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.pending_review, 1);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.total, 3);
    }

    #[tokio::test]
    async fn listing_clamps_limit_and_audits_access() {
        let h = harness();
        let user = sample_user();
        h.engine.register_user(user.clone()).await.unwrap();
        let doc = h
            .engine
            .register_document(sample_document(user.user_id))
            .await
            .unwrap();
        h.engine.confirm_upload(&doc.document_id).await.unwrap();

        let page = h
            .engine
            .list_by_status("admin-1", DocumentStatus::PendingReview, Some(0), None)
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 1);
        assert!(page.next_page_token.is_none());

        let entries = h.store.list_audit(50).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action == ACTION_ADMIN_ACCESS && e.actor == "admin-1"));
    }
}
