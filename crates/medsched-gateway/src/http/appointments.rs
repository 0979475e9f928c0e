//! Appointment endpoints: create, read, self-lists, and the two lifecycle
//! transitions.
//!
//! Every handler follows the same order: resolve identity, authorize,
//! validate, then mutate through a unit of work. Transition handlers check
//! authorization before transition validity, and the status write is
//! version-checked so racing callers get a conflict instead of a lost
//! update.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use medsched_core::config::MAX_REASON_LEN;
use medsched_core::{authorize, next_status, Action, AppointmentStatus, Transition};
use medsched_store::{AppointmentDetail, NewAppointment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::identity::require_caller;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub doctor_id: String,
    /// RFC3339 instant; must be strictly in the future.
    pub date: String,
    pub reason: String,
}

/// Denormalized appointment view with both parties' display names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_specialization: String,
}

impl AppointmentView {
    fn from_detail(d: AppointmentDetail) -> Self {
        Self {
            id: d.appointment.id,
            patient_id: d.appointment.requester_id,
            doctor_id: d.appointment.provider_id,
            date: d.appointment.scheduled_at,
            reason: d.appointment.reason,
            status: d.appointment.status,
            created_at: d.appointment.created_at,
            patient_name: d.requester_name,
            doctor_name: d.provider_name,
            doctor_specialization: d.provider_specialization,
        }
    }
}

/// POST /appointments — book a new appointment (requester, self only).
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateAppointmentRequest>,
) -> ApiResult<(StatusCode, Json<AppointmentView>)> {
    let caller = require_caller(&state, &headers)?;
    authorize(
        &caller,
        &Action::CreateAppointment {
            requester_id: &body.patient_id,
        },
    )?;

    // Validation happens before any store mutation.
    let date: DateTime<Utc> = DateTime::parse_from_rfc3339(&body.date)
        .map_err(|_| ApiError::Validation("date must be an RFC3339 timestamp".to_string()))?
        .with_timezone(&Utc);
    if date <= Utc::now() {
        return Err(ApiError::Validation(
            "appointment date must be in the future".to_string(),
        ));
    }
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::Validation("reason must not be empty".to_string()));
    }
    if reason.len() > MAX_REASON_LEN {
        return Err(ApiError::Validation(format!(
            "reason must be at most {MAX_REASON_LEN} characters"
        )));
    }

    let mut uow = state.store.unit_of_work();
    let appointment = uow.create_appointment(NewAppointment {
        requester_id: body.patient_id,
        provider_id: body.doctor_id,
        scheduled_at: date.to_rfc3339(),
        reason: reason.to_string(),
    })?;
    uow.save()?;

    let detail = uow
        .appointment_detail(&appointment.id)?
        .ok_or(ApiError::Internal)?;

    info!(appointment_id = %appointment.id, "new appointment created");
    Ok((StatusCode::CREATED, Json(AppointmentView::from_detail(detail))))
}

/// GET /appointments/{id} — owner requester or provider only.
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<AppointmentView>> {
    let caller = require_caller(&state, &headers)?;

    let uow = state.store.unit_of_work();
    let detail = uow.appointment_detail(&id)?.ok_or(ApiError::NotFound)?;
    authorize(
        &caller,
        &Action::ReadAppointment {
            requester_id: &detail.appointment.requester_id,
            provider_id: &detail.appointment.provider_id,
        },
    )?;

    Ok(Json(AppointmentView::from_detail(detail)))
}

/// GET /appointments/patient/{id} — self-only list, ordered by date.
pub async fn list_for_requester(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AppointmentView>>> {
    let caller = require_caller(&state, &headers)?;
    authorize(&caller, &Action::ListByRequester { requester_id: &id })?;

    let uow = state.store.unit_of_work();
    let views = uow
        .appointments_for_requester(&id)?
        .into_iter()
        .map(AppointmentView::from_detail)
        .collect();
    Ok(Json(views))
}

/// GET /appointments/doctor/{id} — self-only list, ordered by date.
pub async fn list_for_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AppointmentView>>> {
    let caller = require_caller(&state, &headers)?;
    authorize(&caller, &Action::ListByProvider { provider_id: &id })?;

    let uow = state.store.unit_of_work();
    let views = uow
        .appointments_for_provider(&id)?
        .into_iter()
        .map(AppointmentView::from_detail)
        .collect();
    Ok(Json(views))
}

/// PUT /appointments/{id}/cancel — either owner.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = require_caller(&state, &headers)?;

    let mut uow = state.store.unit_of_work();
    let appointment = uow.appointment_by_id(&id)?.ok_or(ApiError::NotFound)?;
    authorize(
        &caller,
        &Action::Cancel {
            requester_id: &appointment.requester_id,
            provider_id: &appointment.provider_id,
        },
    )?;

    let next = next_status(appointment.status, Transition::Cancel)?;
    uow.update_status(&appointment.id, appointment.version, next)?;
    uow.save()?;

    info!(appointment_id = %id, by = %caller.role, "appointment cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /appointments/{id}/complete — provider owner only.
pub async fn complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let caller = require_caller(&state, &headers)?;

    let mut uow = state.store.unit_of_work();
    let appointment = uow.appointment_by_id(&id)?.ok_or(ApiError::NotFound)?;
    authorize(
        &caller,
        &Action::Complete {
            provider_id: &appointment.provider_id,
        },
    )?;

    let next = next_status(appointment.status, Transition::Complete)?;
    uow.update_status(&appointment.id, appointment.version, next)?;
    uow.save()?;

    info!(appointment_id = %id, "appointment completed");
    Ok(StatusCode::NO_CONTENT)
}
