//! Reviewer identity extraction.
//!
//! Authentication proper lives at the gateway; this service trusts the
//! `x-reviewer-id` header it injects. Privileged routes require the header,
//! and the value becomes the audit-trail actor.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated reviewer's identifier.
pub const REVIEWER_HEADER: &str = "x-reviewer-id";

/// Header carrying the caller's request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The reviewer behind a privileged request.
#[derive(Debug, Clone)]
pub struct Reviewer {
    /// Reviewer identifier, used as the audit actor.
    pub id: String,

    /// Correlation id from the caller, when supplied.
    pub request_id: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Reviewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REVIEWER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);

        Ok(Self { id, request_id })
    }
}
