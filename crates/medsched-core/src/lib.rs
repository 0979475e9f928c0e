//! `medsched-core` — shared types, config, and the two pure decision layers.
//!
//! Everything here is side-effect free: the access policy and the lifecycle
//! state machine take values in and return values out, so every permission
//! rule and status edge is unit-testable without a database or a socket.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod types;

pub use error::{CoreError, Result};
pub use lifecycle::{next_status, InvalidTransition, Transition};
pub use policy::{authorize, Action, Denied};
pub use types::{AppointmentStatus, Caller, Role};
