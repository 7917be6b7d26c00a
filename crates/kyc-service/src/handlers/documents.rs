//! Document lifecycle handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use kyc_core::{Document, DocumentId, DocumentType, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Create document request.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    /// Owner of the document.
    pub user_id: UserId,
    /// Kind of identity document.
    pub document_type: DocumentType,
    /// Filename as supplied by the client.
    pub original_filename: String,
}

/// Document response.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document id.
    pub document_id: String,
    /// Owner of the document.
    pub user_id: String,
    /// Kind of identity document.
    pub document_type: DocumentType,
    /// Current lifecycle status.
    pub status: String,
    /// Object-store bucket holding the file.
    pub storage_bucket: String,
    /// Object-store key of the file.
    pub storage_key: String,
    /// Filename as supplied at upload time.
    pub original_filename: String,
    /// Upload timestamp.
    pub uploaded_at: String,
    /// Decision timestamp, on decided documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
    /// Reviewer, on decided documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// Reviewer comments, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<String>,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            document_id: doc.document_id.to_string(),
            user_id: doc.user_id.to_string(),
            document_type: doc.document_type,
            status: doc.status.as_str().to_string(),
            storage_bucket: doc.storage_bucket.clone(),
            storage_key: doc.storage_key.clone(),
            original_filename: doc.original_filename.clone(),
            uploaded_at: doc.uploaded_at.to_rfc3339(),
            reviewed_at: doc.reviewed_at.map(|t| t.to_rfc3339()),
            reviewed_by: doc.reviewed_by.clone(),
            review_comments: doc.review_comments.clone(),
        }
    }
}

/// Register a document record in the `uploaded` state.
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let filename = body.original_filename.trim();
    if filename.is_empty() {
        return Err(ApiError::BadRequest(
            "original_filename must not be empty".into(),
        ));
    }

    let mut document = Document::new(
        body.user_id,
        body.document_type,
        state.config.storage_bucket.clone(),
        String::new(),
        filename.to_string(),
    );
    document.storage_key = format!("{}/{}/{filename}", body.user_id, document.document_id);

    let created = state.engine.register_document(document).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(&created))))
}

/// Get a document record.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state.engine.get_document(&document_id).await?;
    Ok(Json(DocumentResponse::from(&document)))
}

/// Mark an upload complete, moving the document into the review queue.
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state.engine.confirm_upload(&document_id).await?;
    Ok(Json(DocumentResponse::from(&document)))
}
