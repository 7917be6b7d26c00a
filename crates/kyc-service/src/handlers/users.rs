//! User compliance record handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use kyc_core::{UserId, UserRecord, UserType};

use crate::error::ApiError;
use crate::state::AppState;

/// Create user request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// User id assigned by the identity layer.
    pub user_id: UserId,
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Individual or business customer.
    pub user_type: UserType,
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id.
    pub user_id: String,
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Customer kind.
    pub user_type: UserType,
    /// Aggregate compliance status.
    pub kyc_status: String,
    /// Created timestamp.
    pub created_at: String,
    /// Last updated timestamp.
    pub updated_at: String,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_type: user.user_type,
            kyc_status: user.kyc_status.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Create a user compliance record.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email must not be empty".into()));
    }

    let record = UserRecord::new(
        body.user_id,
        body.email,
        body.first_name,
        body.last_name,
        body.user_type,
    );
    let created = state.engine.register_user(record).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&created))))
}

/// Get a user compliance record.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.engine.get_user(&user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}
