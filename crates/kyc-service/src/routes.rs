//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{documents, health, reviews, users};
use crate::state::AppState;

/// Maximum concurrent requests for review-decision endpoints.
const REVIEW_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Users and documents
/// - `POST /v1/users` - Create a user compliance record
/// - `GET /v1/users/:user_id` - Get a user compliance record
/// - `POST /v1/documents` - Register a document record
/// - `GET /v1/documents/:document_id` - Get a document record
/// - `POST /v1/documents/:document_id/complete` - Mark an upload complete
///
/// ## Review queue (reviewer identity header required)
/// - `GET /v1/documents/pending` - The review queue, paged
/// - `GET /v1/documents?status=&limit=&page_token=` - List by status, paged
/// - `GET /v1/documents/summary` - Document counts per status
/// - `POST /v1/reviews/:document_id/approve` - Approve a document
/// - `POST /v1/reviews/:document_id/reject` - Reject a document
/// - `GET /v1/audit` - Recent audit entries
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let review_routes = Router::new()
        .route("/:document_id/approve", post(reviews::approve))
        .route("/:document_id/reject", post(reviews::reject))
        .layer(ConcurrencyLimitLayer::new(REVIEW_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        .route(
            "/documents",
            post(documents::create_document).get(reviews::list_documents),
        )
        .route("/documents/pending", get(reviews::pending_documents))
        .route("/documents/summary", get(reviews::summary))
        .route("/documents/:document_id", get(documents::get_document))
        .route(
            "/documents/:document_id/complete",
            post(documents::complete_upload),
        )
        .route("/audit", get(reviews::audit_log))
        .nest("/reviews", review_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
