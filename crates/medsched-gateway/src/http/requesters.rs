//! Requester (patient) account endpoints: register, login, self profile,
//! and the provider-facing directory.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use medsched_auth::{password, AuthError};
use medsched_core::{authorize, Action, Caller, Role};
use medsched_store::{NewRequester, Requester, RequesterPatch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::identity::require_caller;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequesterRequest {
    pub name: String,
    /// ISO-8601 date (YYYY-MM-DD).
    pub birth_date: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequesterRequest {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterView {
    pub id: String,
    pub name: String,
    pub birth_date: String,
    pub email: String,
    pub phone: String,
    pub created_at: String,
}

impl RequesterView {
    fn from_record(r: Requester) -> Self {
        Self {
            id: r.id,
            name: r.name,
            birth_date: r.birth_date,
            email: r.email,
            phone: r.phone,
            created_at: r.created_at,
        }
    }
}

/// POST /requesters/register — open endpoint.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequesterRequest>,
) -> ApiResult<(StatusCode, Json<RequesterView>)> {
    validate_registration(&body.name, &body.email, &body.password)?;

    let password_hash = password::hash(&body.password)?;
    let mut uow = state.store.unit_of_work();
    if uow.requester_by_email(&body.email)?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let requester = uow.create_requester(NewRequester {
        name: body.name,
        birth_date: body.birth_date,
        email: body.email,
        phone: body.phone,
        password_hash,
    })?;
    uow.save()?;

    info!(requester_id = %requester.id, "new requester registered");
    Ok((StatusCode::CREATED, Json(RequesterView::from_record(requester))))
}

/// POST /requesters/login — open endpoint, returns a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let uow = state.store.unit_of_work();
    let requester = uow
        .requester_by_email(&body.email)?
        .ok_or(AuthError::InvalidCredentials)?;
    if !password::verify(&body.password, &requester.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }
    drop(uow);

    let caller = Caller::new(requester.id.clone(), Role::Requester);
    let token = state.tokens.issue(&caller);
    info!(requester_id = %requester.id, "requester logged in");
    Ok(Json(json!({ "token": token })))
}

/// GET /requesters — provider-facing directory of all requesters.
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<RequesterView>>> {
    let caller = require_caller(&state, &headers)?;
    authorize(&caller, &Action::ListAllRequesters)?;

    let uow = state.store.unit_of_work();
    let views = uow
        .list_requesters()?
        .into_iter()
        .map(RequesterView::from_record)
        .collect();
    Ok(Json(views))
}

/// GET /requesters/{id} — self only.
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<RequesterView>> {
    let caller = require_caller(&state, &headers)?;
    authorize(
        &caller,
        &Action::ReadProfile {
            subject_role: Role::Requester,
            subject_id: &id,
        },
    )?;

    let uow = state.store.unit_of_work();
    let requester = uow.requester_by_id(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(RequesterView::from_record(requester)))
}

/// PUT /requesters/{id} — partial self-update; absent fields are no-ops.
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequesterRequest>,
) -> ApiResult<Json<RequesterView>> {
    let caller = require_caller(&state, &headers)?;
    authorize(
        &caller,
        &Action::UpdateProfile {
            subject_role: Role::Requester,
            subject_id: &id,
        },
    )?;
    if let Some(ref email) = body.email {
        validate_email(email)?;
    }

    let patch = RequesterPatch {
        name: body.name,
        birth_date: body.birth_date,
        email: body.email,
        phone: body.phone,
    };
    let mut uow = state.store.unit_of_work();
    let requester = uow.update_requester(&id, &patch)?;
    uow.save()?;

    info!(requester_id = %id, "requester profile updated");
    Ok(Json(RequesterView::from_record(requester)))
}

pub(crate) fn validate_registration(name: &str, email: &str, password: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    validate_email(email)?;
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> ApiResult<()> {
    // Shallow shape check; real mailbox verification is out of scope.
    if email.contains('@') && !email.starts_with('@') && !email.ends_with('@') {
        Ok(())
    } else {
        Err(ApiError::Validation("email is not valid".to_string()))
    }
}
