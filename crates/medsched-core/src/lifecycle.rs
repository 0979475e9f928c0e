use crate::types::AppointmentStatus;
use thiserror::Error;

/// The two permitted status changes. Authorization is checked before this
/// layer ever sees the request; only state validity is decided here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Cancel,
    Complete,
}

/// Rejected transition. Each variant implies the current status, so the
/// gateway can answer 409 with the state conflict spelled out without a
/// second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("appointment is already cancelled")]
    AlreadyCancelled,

    #[error("appointment is already completed")]
    AlreadyCompleted,

    #[error("cannot cancel a completed appointment")]
    CancelAfterCompletion,

    #[error("cannot complete a cancelled appointment")]
    CompleteAfterCancellation,
}

/// Compute the status an appointment moves to, or reject the edge.
///
/// The graph is fixed and tiny: Scheduled→Cancelled and Scheduled→Completed
/// are the only edges. Both targets are terminal and Scheduled is never
/// re-entered.
pub fn next_status(
    current: AppointmentStatus,
    transition: Transition,
) -> Result<AppointmentStatus, InvalidTransition> {
    use AppointmentStatus::*;
    match (current, transition) {
        (Scheduled, Transition::Cancel) => Ok(Cancelled),
        (Scheduled, Transition::Complete) => Ok(Completed),
        (Cancelled, Transition::Cancel) => Err(InvalidTransition::AlreadyCancelled),
        (Completed, Transition::Complete) => Err(InvalidTransition::AlreadyCompleted),
        (Completed, Transition::Cancel) => Err(InvalidTransition::CancelAfterCompletion),
        (Cancelled, Transition::Complete) => Err(InvalidTransition::CompleteAfterCancellation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn scheduled_can_cancel_and_complete() {
        assert_eq!(next_status(Scheduled, Transition::Cancel), Ok(Cancelled));
        assert_eq!(next_status(Scheduled, Transition::Complete), Ok(Completed));
    }

    #[test]
    fn terminal_states_reject_everything() {
        assert_eq!(
            next_status(Cancelled, Transition::Cancel),
            Err(InvalidTransition::AlreadyCancelled)
        );
        assert_eq!(
            next_status(Cancelled, Transition::Complete),
            Err(InvalidTransition::CompleteAfterCancellation)
        );
        assert_eq!(
            next_status(Completed, Transition::Complete),
            Err(InvalidTransition::AlreadyCompleted)
        );
        assert_eq!(
            next_status(Completed, Transition::Cancel),
            Err(InvalidTransition::CancelAfterCompletion)
        );
    }

    /// The full reachability check: starting from Scheduled, no sequence of
    /// transitions ever leads back to Scheduled or between terminals.
    #[test]
    fn no_edge_revisits_scheduled() {
        for start in [Cancelled, Completed] {
            for t in [Transition::Cancel, Transition::Complete] {
                assert!(next_status(start, t).is_err());
            }
        }
    }
}
