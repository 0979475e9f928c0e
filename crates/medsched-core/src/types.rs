use serde::{Deserialize, Serialize};
use std::fmt;

/// The two caller roles with asymmetric permissions on an appointment.
///
/// A requester (patient) books appointments for themself; a provider
/// (doctor) fulfils them. The role is fixed at registration time and is
/// carried inside the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Requester,
    Provider,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Requester => write!(f, "requester"),
            Role::Provider => write!(f, "provider"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "requester" => Ok(Role::Requester),
            "provider" => Ok(Role::Provider),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Authenticated caller identity, resolved once per request from the
/// session token and passed explicitly into the policy layer.
///
/// Handlers never re-parse claims: this is the only place id and role live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// UUIDv7 string of the requester or provider record.
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Appointment lifecycle status. `Scheduled` is initial; the other two are
/// terminal — see [`crate::lifecycle`] for the permitted edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}
