use async_trait::async_trait;
use medsched_store::AppointmentDetail;
use serde::Serialize;
use tracing::info;

use crate::error::Result;

/// Everything the external notification collaborator needs to reach both
/// parties about an upcoming appointment.
#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub appointment_id: String,
    pub requester_name: String,
    pub requester_email: String,
    pub provider_name: String,
    pub provider_email: String,
    /// RFC3339 UTC instant of the appointment.
    pub scheduled_at: String,
}

impl Reminder {
    pub fn from_detail(detail: &AppointmentDetail) -> Self {
        Self {
            appointment_id: detail.appointment.id.clone(),
            requester_name: detail.requester_name.clone(),
            requester_email: detail.requester_email.clone(),
            provider_name: detail.provider_name.clone(),
            provider_email: detail.provider_email.clone(),
            scheduled_at: detail.appointment.scheduled_at.clone(),
        }
    }
}

/// Delivery seam. Email/SMS/push live behind this trait; the engine only
/// promises at-most-once per appointment per day on its side.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, reminder: &Reminder) -> Result<()>;
}

/// Default notifier: structured log line per reminder. Stands in for the
/// real delivery collaborator in development and tests.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, reminder: &Reminder) -> Result<()> {
        info!(
            appointment_id = %reminder.appointment_id,
            requester = %reminder.requester_name,
            requester_email = %reminder.requester_email,
            provider = %reminder.provider_name,
            provider_email = %reminder.provider_email,
            scheduled_at = %reminder.scheduled_at,
            "sending appointment reminder"
        );
        Ok(())
    }
}
