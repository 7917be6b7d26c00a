//! Review decision and queue handlers.
//!
//! Every route here is privileged: the [`Reviewer`] extractor requires the
//! reviewer identity header, and access is written to the audit trail.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use kyc_core::{AuditEntry, Document, DocumentId, DocumentStatus, UserId};
use kyc_review::{ReviewDecision, ReviewRequest, StatusSummary};
use kyc_store::DocumentPage;

use crate::auth::Reviewer;
use crate::error::ApiError;
use crate::handlers::documents::DocumentResponse;
use crate::state::AppState;

/// Review decision request body.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// Owner the document is expected to belong to.
    pub user_id: UserId,
    /// Reviewer comments. Required for rejections.
    pub comments: Option<String>,
}

/// Review decision response.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Document that was decided.
    pub document_id: String,
    /// Terminal status the decision produced.
    pub status: String,
    /// Reviewer that made the decision.
    pub reviewed_by: String,
    /// Decision timestamp.
    pub reviewed_at: String,
    /// Reviewer comments, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl From<&Document> for DecisionResponse {
    fn from(doc: &Document) -> Self {
        Self {
            message: format!("Document {}", doc.status),
            document_id: doc.document_id.to_string(),
            status: doc.status.as_str().to_string(),
            reviewed_by: doc.reviewed_by.clone().unwrap_or_default(),
            reviewed_at: doc
                .reviewed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            comments: doc.review_comments.clone(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Status to list; defaults to `pending_review`.
    pub status: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
}

/// One page of documents.
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    /// Documents on this page, in upload order.
    pub documents: Vec<DocumentResponse>,
    /// Number of documents on this page.
    pub count: usize,
    /// Continuation token; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl From<DocumentPage> for DocumentListResponse {
    fn from(page: DocumentPage) -> Self {
        let documents: Vec<_> = page.documents.iter().map(DocumentResponse::from).collect();
        Self {
            count: documents.len(),
            documents,
            page_token: page.next_page_token,
        }
    }
}

/// Audit log query parameters.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Maximum number of entries.
    pub limit: Option<usize>,
}

/// Approve a document.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
    Path(document_id): Path<DocumentId>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(state, reviewer, document_id, ReviewDecision::Approve, body).await
}

/// Reject a document. Comments are required.
pub async fn reject(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
    Path(document_id): Path<DocumentId>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    decide(state, reviewer, document_id, ReviewDecision::Reject, body).await
}

async fn decide(
    state: Arc<AppState>,
    reviewer: Reviewer,
    document_id: DocumentId,
    decision: ReviewDecision,
    body: DecisionRequest,
) -> Result<Json<DecisionResponse>, ApiError> {
    let request = ReviewRequest {
        actor: reviewer.id,
        request_id: reviewer.request_id,
        user_id: body.user_id,
        document_id,
        decision,
        comments: body.comments,
    };

    let updated = state.engine.decide(&request).await?;
    Ok(Json(DecisionResponse::from(&updated)))
}

/// List documents by status, paged. Defaults to the review queue.
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let status = match query.status.as_deref() {
        None => DocumentStatus::PendingReview,
        Some(s) => DocumentStatus::parse(s)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {s}")))?,
    };

    let page = state
        .engine
        .list_by_status(&reviewer.id, status, query.limit, query.page_token)
        .await?;
    Ok(Json(page.into()))
}

/// The review queue: documents awaiting a decision.
pub async fn pending_documents(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let page = state
        .engine
        .pending(&reviewer.id, query.limit, query.page_token)
        .await?;
    Ok(Json(page.into()))
}

/// Document counts per lifecycle status.
pub async fn summary(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
) -> Result<Json<StatusSummary>, ApiError> {
    let summary = state.engine.status_summary(&reviewer.id).await?;
    Ok(Json(summary))
}

/// Recent audit entries, newest first.
pub async fn audit_log(
    State(state): State<Arc<AppState>>,
    reviewer: Reviewer,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let entries = state.engine.recent_audit(&reviewer.id, query.limit).await?;
    Ok(Json(entries))
}
