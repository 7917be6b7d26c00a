//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kyc_core::Classified;
use kyc_review::ReviewError;
use serde::Serialize;
use uuid::Uuid;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid reviewer identity.
    #[error("unauthorized")]
    Unauthorized,

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A failure classified by the review engine.
    #[error("{}", .0.user_message)]
    Classified(Classified),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Fresh id per failure so a support ticket can be matched to the log
        // line carrying the technical detail.
        let request_id = Uuid::new_v4().to_string();

        let (status, code, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                "Missing or invalid reviewer identity".to_string(),
            ),
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED".to_string(),
                msg,
            ),
            Self::Classified(c) => {
                if c.http_status >= 500 {
                    tracing::error!(
                        request_id = %request_id,
                        code = c.error_code,
                        category = %c.category,
                        detail = %c.technical_message,
                        "request failed"
                    );
                } else {
                    tracing::debug!(
                        request_id = %request_id,
                        code = c.error_code,
                        category = %c.category,
                        detail = %c.technical_message,
                        "request rejected"
                    );
                }
                (
                    StatusCode::from_u16(c.http_status)
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    c.error_code.to_string(),
                    c.user_message,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                request_id,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        Self::Classified(err.classified())
    }
}
