pub mod appointments;
pub mod health;
pub mod providers;
pub mod requesters;
