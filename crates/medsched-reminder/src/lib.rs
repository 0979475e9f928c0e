//! `medsched-reminder` — periodic scan for appointments entering the
//! notification window.
//!
//! The engine runs on its own long-lived tokio task, independent of request
//! handling. Each tick recomputes the rolling window `[now+1d, now+2d)`
//! from scratch; the `reminder_log` table dedups delivery to once per
//! appointment per day, so a failing or restarted process never loses track
//! of what was already sent.

pub mod engine;
pub mod error;
pub mod notify;

pub use engine::{notification_window, ReminderEngine};
pub use error::{ReminderError, Result};
pub use notify::{Notifier, Reminder, TracingNotifier};
