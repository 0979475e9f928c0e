use axum::http::HeaderMap;
use medsched_core::Caller;

use crate::app::AppState;
use crate::error::ApiError;

/// Resolve the bearer token into a typed caller identity, once per request.
/// Handlers receive the `Caller` value and never touch the token again.
pub fn require_caller(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized("missing Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Authorization header must use Bearer scheme"))?;

    Ok(state.tokens.verify(token)?)
}
