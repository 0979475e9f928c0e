//! `medsched-store` — SQLite record store for requesters, providers, and
//! appointments.
//!
//! All access goes through a [`UnitOfWork`]: mutations are staged inside a
//! transaction boundary and become durable together at commit, or not at
//! all. Dropping a unit of work without committing rolls back.

pub mod db;
pub mod error;
pub mod types;
pub mod uow;

pub use error::{Result, StoreError};
pub use types::{
    Appointment, AppointmentDetail, NewAppointment, NewProvider, NewRequester, Provider,
    ProviderPatch, Requester, RequesterPatch,
};
pub use uow::{Store, UnitOfWork};
