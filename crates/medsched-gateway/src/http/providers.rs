//! Provider (doctor) account endpoints: register, login, self profile.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use medsched_auth::{password, AuthError};
use medsched_core::{authorize, Action, Caller, Role};
use medsched_store::{NewProvider, Provider, ProviderPatch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::http::requesters::{validate_email, validate_registration, LoginRequest};
use crate::identity::require_caller;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProviderRequest {
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProviderRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub created_at: String,
}

impl ProviderView {
    fn from_record(p: Provider) -> Self {
        Self {
            id: p.id,
            name: p.name,
            specialization: p.specialization,
            email: p.email,
            phone: p.phone,
            created_at: p.created_at,
        }
    }
}

/// POST /providers/register — open endpoint.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterProviderRequest>,
) -> ApiResult<(StatusCode, Json<ProviderView>)> {
    validate_registration(&body.name, &body.email, &body.password)?;
    if body.specialization.trim().is_empty() {
        return Err(ApiError::Validation(
            "specialization must not be empty".to_string(),
        ));
    }

    let password_hash = password::hash(&body.password)?;
    let mut uow = state.store.unit_of_work();
    if uow.provider_by_email(&body.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let provider = uow.create_provider(NewProvider {
        name: body.name,
        specialization: body.specialization,
        email: body.email,
        phone: body.phone,
        password_hash,
    })?;
    uow.save()?;

    info!(provider_id = %provider.id, "new provider registered");
    Ok((StatusCode::CREATED, Json(ProviderView::from_record(provider))))
}

/// POST /providers/login — open endpoint, returns a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let uow = state.store.unit_of_work();
    let provider = uow
        .provider_by_email(&body.email)?
        .ok_or(AuthError::InvalidCredentials)?;
    if !password::verify(&body.password, &provider.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }
    drop(uow);

    let caller = Caller::new(provider.id.clone(), Role::Provider);
    let token = state.tokens.issue(&caller);
    info!(provider_id = %provider.id, "provider logged in");
    Ok(Json(json!({ "token": token })))
}

/// GET /providers/{id} — self only.
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ProviderView>> {
    let caller = require_caller(&state, &headers)?;
    authorize(
        &caller,
        &Action::ReadProfile {
            subject_role: Role::Provider,
            subject_id: &id,
        },
    )?;

    let uow = state.store.unit_of_work();
    let provider = uow.provider_by_id(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(ProviderView::from_record(provider)))
}

/// PUT /providers/{id} — partial self-update; absent fields are no-ops.
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateProviderRequest>,
) -> ApiResult<Json<ProviderView>> {
    let caller = require_caller(&state, &headers)?;
    authorize(
        &caller,
        &Action::UpdateProfile {
            subject_role: Role::Provider,
            subject_id: &id,
        },
    )?;
    if let Some(ref email) = body.email {
        validate_email(email)?;
    }

    let patch = ProviderPatch {
        name: body.name,
        specialization: body.specialization,
        email: body.email,
        phone: body.phone,
    };
    let mut uow = state.store.unit_of_work();
    let provider = uow.update_provider(&id, &patch)?;
    uow.save()?;

    info!(provider_id = %id, "provider profile updated");
    Ok(Json(ProviderView::from_record(provider)))
}
