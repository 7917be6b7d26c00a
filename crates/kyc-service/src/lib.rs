//! KYC HTTP API Service.
//!
//! This crate provides the HTTP API for the KYC document review backend:
//!
//! - User compliance records
//! - Document registration and upload confirmation
//! - The admin review queue and decisions
//! - The audit trail
//!
//! Reviewer identity arrives in the `x-reviewer-id` header, injected by the
//! gateway in front of this service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
