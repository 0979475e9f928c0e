use medsched_core::AppointmentStatus;
use serde::{Deserialize, Serialize};

/// A patient-side account. Created once at registration, mutated only via
/// [`RequesterPatch`], never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    /// UUIDv7 — time-sortable, useful for log correlation.
    pub id: String,
    pub name: String,
    /// ISO-8601 date (YYYY-MM-DD).
    pub birth_date: String,
    /// Unique within the requesters collection (a provider may reuse it).
    pub email: String,
    pub phone: String,
    /// Argon2 PHC string. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

/// A doctor-side account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// Registration input for a requester. Id and timestamps are generated by
/// the store so callers always get the canonical record back.
#[derive(Debug, Clone)]
pub struct NewRequester {
    pub name: String,
    pub birth_date: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Partial self-update: each present field overwrites, each absent field is
/// a no-op. Applied deterministically field-by-field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequesterPatch {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl RequesterPatch {
    pub(crate) fn apply(&self, r: &mut Requester) {
        if let Some(ref v) = self.name {
            r.name = v.clone();
        }
        if let Some(ref v) = self.birth_date {
            r.birth_date = v.clone();
        }
        if let Some(ref v) = self.email {
            r.email = v.clone();
        }
        if let Some(ref v) = self.phone {
            r.phone = v.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderPatch {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ProviderPatch {
    pub(crate) fn apply(&self, p: &mut Provider) {
        if let Some(ref v) = self.name {
            p.name = v.clone();
        }
        if let Some(ref v) = self.specialization {
            p.specialization = v.clone();
        }
        if let Some(ref v) = self.email {
            p.email = v.clone();
        }
        if let Some(ref v) = self.phone {
            p.phone = v.clone();
        }
    }
}

/// A scheduling record. The two party references are immutable after
/// creation; the only mutable fields are `status` and its `version` guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub requester_id: String,
    pub provider_id: String,
    /// RFC3339 UTC instant. Strictly future at creation time; never
    /// re-checked afterwards, so a Scheduled appointment may be in the past.
    pub scheduled_at: String,
    pub reason: String,
    pub status: AppointmentStatus,
    /// Optimistic-concurrency token, bumped on every status write.
    pub version: i64,
    pub created_at: String,
}

/// Creation input. Status always starts at Scheduled.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub requester_id: String,
    pub provider_id: String,
    pub scheduled_at: String,
    pub reason: String,
}

/// An appointment joined with both parties — the denormalized shape the
/// HTTP views and the reminder scan both need.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub requester_name: String,
    pub requester_email: String,
    pub provider_name: String,
    pub provider_email: String,
    pub provider_specialization: String,
}
