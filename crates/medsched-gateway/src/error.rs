//! The single boundary layer turning component errors into HTTP responses.
//!
//! Components fail fast with typed errors; only this module decides status
//! codes and response bodies, and only this module logs internal faults.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use medsched_auth::AuthError;
use medsched_core::{Denied, InvalidTransition};
use medsched_store::StoreError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input, rejected before any store mutation.
    Validation(String),
    /// Missing, malformed, expired, or forged credentials.
    Unauthorized(&'static str),
    /// Authenticated but not entitled. Body is fixed: existence and state
    /// of the target are never leaked here.
    Forbidden,
    NotFound,
    /// State conflict — invalid transition, duplicate email, lost write race.
    Conflict(String),
    /// Opaque to the caller; full context is logged server-side at the
    /// conversion site.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound,
            StoreError::DuplicateEmail(_) => {
                ApiError::Conflict("email already registered".to_string())
            }
            StoreError::StaleVersion { .. } => {
                ApiError::Conflict("appointment was modified concurrently".to_string())
            }
            StoreError::Transaction(ref msg) => {
                error!("transaction error: {msg}");
                ApiError::Internal
            }
            StoreError::Database(ref db) => {
                error!("database error: {db}");
                ApiError::Internal
            }
        }
    }
}

impl From<Denied> for ApiError {
    fn from(_: Denied) -> Self {
        ApiError::Forbidden
    }
}

impl From<InvalidTransition> for ApiError {
    fn from(e: InvalidTransition) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized("invalid credentials"),
            AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                ApiError::Unauthorized("invalid or expired token")
            }
            AuthError::Hash(ref msg) => {
                error!("password hashing failure: {msg}");
                ApiError::Internal
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
