use crate::types::{Caller, Role};
use thiserror::Error;

/// Everything a caller can ask the system to do, with the ownership facts
/// the decision needs baked into the variant. Adding a new action here
/// forces the compiler to ensure `authorize` handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    /// Book a new appointment naming `requester_id` as the requesting party.
    CreateAppointment { requester_id: &'a str },
    /// Read a single appointment owned by these two parties.
    ReadAppointment {
        requester_id: &'a str,
        provider_id: &'a str,
    },
    /// List all appointments of the requester at `requester_id`.
    ListByRequester { requester_id: &'a str },
    /// List all appointments of the provider at `provider_id`.
    ListByProvider { provider_id: &'a str },
    /// Browse the requester directory (provider-facing).
    ListAllRequesters,
    /// Cancel the appointment owned by these two parties.
    Cancel {
        requester_id: &'a str,
        provider_id: &'a str,
    },
    /// Mark the appointment fulfilled. Provider-side only.
    Complete { provider_id: &'a str },
    /// Read the profile of the `subject_role` record at `subject_id`.
    ReadProfile {
        subject_role: Role,
        subject_id: &'a str,
    },
    /// Partially update the profile at `subject_id`.
    UpdateProfile {
        subject_role: Role,
        subject_id: &'a str,
    },
}

/// Authorization refusal. Deliberately carries no information about the
/// target resource — the gateway turns this into a bare 403.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("forbidden: {reason}")]
pub struct Denied {
    pub reason: &'static str,
}

impl Denied {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Evaluate whether `caller` may perform `action`.
///
/// Ownership and role rules only; whether the resource exists or which
/// lifecycle state it is in is someone else's problem. Deny is the default
/// for any combination not explicitly matched.
pub fn authorize(caller: &Caller, action: &Action<'_>) -> Result<(), Denied> {
    match action {
        // A requester may only book for themself.
        Action::CreateAppointment { requester_id } => {
            if caller.role != Role::Requester {
                return Err(Denied::new("only requesters can book appointments"));
            }
            if caller.id != *requester_id {
                return Err(Denied::new("cannot book on behalf of another requester"));
            }
            Ok(())
        }

        // Either owner may read; third parties get nothing.
        Action::ReadAppointment {
            requester_id,
            provider_id,
        } => match caller.role {
            Role::Requester if caller.id == *requester_id => Ok(()),
            Role::Provider if caller.id == *provider_id => Ok(()),
            _ => Err(Denied::new("not a party to this appointment")),
        },

        // List endpoints are self-only regardless of role.
        Action::ListByRequester { requester_id } => {
            if caller.id == *requester_id {
                Ok(())
            } else {
                Err(Denied::new("can only list your own appointments"))
            }
        }
        Action::ListByProvider { provider_id } => {
            if caller.id == *provider_id {
                Ok(())
            } else {
                Err(Denied::new("can only list your own appointments"))
            }
        }

        Action::ListAllRequesters => {
            if caller.role == Role::Provider {
                Ok(())
            } else {
                Err(Denied::new("provider role required"))
            }
        }

        Action::Cancel {
            requester_id,
            provider_id,
        } => match caller.role {
            Role::Requester if caller.id == *requester_id => Ok(()),
            Role::Provider if caller.id == *provider_id => Ok(()),
            _ => Err(Denied::new("not a party to this appointment")),
        },

        Action::Complete { provider_id } => {
            if caller.role == Role::Provider && caller.id == *provider_id {
                Ok(())
            } else {
                Err(Denied::new("only the appointment's provider can complete it"))
            }
        }

        Action::ReadProfile {
            subject_role,
            subject_id,
        }
        | Action::UpdateProfile {
            subject_role,
            subject_id,
        } => {
            if caller.role == *subject_role && caller.id == *subject_id {
                Ok(())
            } else {
                Err(Denied::new("profiles are self-only"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requester(id: &str) -> Caller {
        Caller::new(id, Role::Requester)
    }

    fn provider(id: &str) -> Caller {
        Caller::new(id, Role::Provider)
    }

    #[test]
    fn requester_books_for_self_only() {
        let action = Action::CreateAppointment { requester_id: "r1" };
        assert!(authorize(&requester("r1"), &action).is_ok());
        assert!(authorize(&requester("r2"), &action).is_err());
        assert!(authorize(&provider("r1"), &action).is_err());
    }

    #[test]
    fn either_owner_reads_third_party_denied() {
        let action = Action::ReadAppointment {
            requester_id: "r1",
            provider_id: "p1",
        };
        assert!(authorize(&requester("r1"), &action).is_ok());
        assert!(authorize(&provider("p1"), &action).is_ok());
        assert!(authorize(&requester("r2"), &action).is_err());
        assert!(authorize(&provider("p2"), &action).is_err());
        // Role mismatch on a matching id is still denied.
        assert!(authorize(&provider("r1"), &action).is_err());
    }

    #[test]
    fn lists_are_self_only() {
        assert!(authorize(
            &requester("r1"),
            &Action::ListByRequester { requester_id: "r1" }
        )
        .is_ok());
        assert!(authorize(
            &requester("r2"),
            &Action::ListByRequester { requester_id: "r1" }
        )
        .is_err());
        assert!(authorize(
            &provider("p1"),
            &Action::ListByProvider { provider_id: "p1" }
        )
        .is_ok());
        assert!(authorize(
            &provider("p2"),
            &Action::ListByProvider { provider_id: "p1" }
        )
        .is_err());
    }

    #[test]
    fn complete_is_provider_owner_only() {
        let action = Action::Complete { provider_id: "p1" };
        assert!(authorize(&provider("p1"), &action).is_ok());
        assert!(authorize(&provider("p2"), &action).is_err());
        // The requester owner cannot complete, even their own appointment.
        assert!(authorize(&requester("p1"), &action).is_err());
    }

    #[test]
    fn cancel_allows_both_owners() {
        let action = Action::Cancel {
            requester_id: "r1",
            provider_id: "p1",
        };
        assert!(authorize(&requester("r1"), &action).is_ok());
        assert!(authorize(&provider("p1"), &action).is_ok());
        assert!(authorize(&requester("r9"), &action).is_err());
    }

    #[test]
    fn profiles_require_matching_role_and_id() {
        let action = Action::ReadProfile {
            subject_role: Role::Provider,
            subject_id: "p1",
        };
        assert!(authorize(&provider("p1"), &action).is_ok());
        assert!(authorize(&provider("p2"), &action).is_err());
        assert!(authorize(&requester("p1"), &action).is_err());
    }

    #[test]
    fn requester_directory_is_provider_only() {
        assert!(authorize(&provider("p1"), &Action::ListAllRequesters).is_ok());
        assert!(authorize(&requester("r1"), &Action::ListAllRequesters).is_err());
    }
}
