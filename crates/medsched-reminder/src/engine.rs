use std::time::Duration;

use chrono::{DateTime, Utc};
use medsched_store::Store;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::notify::{Notifier, Reminder};

/// The rolling notification window for a given instant: appointments with
/// `now + 1 day <= scheduled_at < now + 2 days` qualify.
pub fn notification_window(now: DateTime<Utc>) -> (String, String) {
    let start = now + chrono::Duration::days(1);
    let end = now + chrono::Duration::days(2);
    (start.to_rfc3339(), end.to_rfc3339())
}

/// Periodic reminder scanner. Owns its own [`Store`] handle and opens a
/// short-lived unit of work per tick, never sharing state with request
/// handling.
pub struct ReminderEngine {
    store: Store,
    notifier: Box<dyn Notifier>,
    period: Duration,
}

impl ReminderEngine {
    pub fn new(store: Store, notifier: Box<dyn Notifier>, period: Duration) -> Self {
        Self {
            store,
            notifier,
            period,
        }
    }

    /// Main loop. Ticks on the configured period until `shutdown`
    /// broadcasts `true`; a failing tick is logged and the next one runs
    /// anyway. Shutdown waits for the in-flight tick to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "reminder engine started");

        let mut interval = tokio::time::interval(self.period);
        // The first interval fire is immediate; skip it so the engine
        // scans one full period after startup, like a fresh timer.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("reminder tick failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reminder engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One scan: find Scheduled appointments inside the window, claim the
    /// (appointment, day) dedup slot, notify the fresh ones.
    pub async fn tick(&self) -> Result<()> {
        let now = Utc::now();
        let (start, end) = notification_window(now);
        let today = now.format("%Y-%m-%d").to_string();

        // Scan and claim inside one unit of work, dropped before the async
        // notify calls so the store lock never spans an await.
        let due: Vec<Reminder> = {
            let mut uow = self.store.unit_of_work();
            let matches = uow.scheduled_in_window(&start, &end)?;
            let mut fresh = Vec::new();
            for detail in matches {
                if uow.mark_reminded(&detail.appointment.id, &today)? {
                    fresh.push(Reminder::from_detail(&detail));
                }
            }
            uow.save()?;
            fresh
        };

        let count = due.len();
        for reminder in due {
            if let Err(e) = self.notifier.notify(&reminder).await {
                // The dedup slot stays claimed: delivery retries are the
                // notification collaborator's job, not the scanner's.
                warn!(appointment_id = %reminder.appointment_id, "reminder delivery failed: {e}");
            }
        }

        info!(count, "processed upcoming appointments for reminders");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medsched_store::{NewAppointment, NewProvider, NewRequester};
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    struct CollectingNotifier {
        sent: Arc<Mutex<Vec<Reminder>>>,
    }

    #[async_trait]
    impl Notifier for CollectingNotifier {
        async fn notify(&self, reminder: &Reminder) -> crate::error::Result<()> {
            self.sent.lock().unwrap().push(reminder.clone());
            Ok(())
        }
    }

    fn seeded_store(offset_hours: i64) -> Store {
        let store = Store::new(Connection::open_in_memory().unwrap()).unwrap();
        let mut uow = store.unit_of_work();
        let r = uow
            .create_requester(NewRequester {
                name: "Ada Riley".to_string(),
                birth_date: "1990-03-14".to_string(),
                email: "ada@example.com".to_string(),
                phone: "+1-555-0101".to_string(),
                password_hash: "$argon2id$stub".to_string(),
            })
            .unwrap();
        let p = uow
            .create_provider(NewProvider {
                name: "Dr. Flores".to_string(),
                specialization: "Cardiology".to_string(),
                email: "flores@example.com".to_string(),
                phone: "+1-555-0202".to_string(),
                password_hash: "$argon2id$stub".to_string(),
            })
            .unwrap();
        uow.create_appointment(NewAppointment {
            requester_id: r.id,
            provider_id: p.id,
            scheduled_at: (Utc::now() + chrono::Duration::hours(offset_hours)).to_rfc3339(),
            reason: "checkup".to_string(),
        })
        .unwrap();
        uow.save().unwrap();
        drop(uow);
        store
    }

    fn engine_with(store: Store) -> (ReminderEngine, Arc<Mutex<Vec<Reminder>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let engine = ReminderEngine::new(
            store,
            Box::new(CollectingNotifier { sent: sent.clone() }),
            Duration::from_secs(3600),
        );
        (engine, sent)
    }

    #[tokio::test]
    async fn in_window_appointment_notified_exactly_once() {
        // now + 1.5 days falls inside [now+1d, now+2d).
        let (engine, sent) = engine_with(seeded_store(36));

        engine.tick().await.unwrap();
        let first = sent.lock().unwrap()[0].clone();
        assert_eq!(first.requester_email, "ada@example.com");
        assert_eq!(first.provider_email, "flores@example.com");
        assert_eq!(sent.lock().unwrap().len(), 1);

        // Second tick the same day: still in window, but the dedup slot is
        // already claimed.
        engine.tick().await.unwrap();
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_of_window_appointments_are_skipped() {
        let (engine, sent) = engine_with(seeded_store(12)); // too soon
        engine.tick().await.unwrap();
        assert!(sent.lock().unwrap().is_empty());

        let (engine, sent) = engine_with(seeded_store(50)); // too far out
        engine.tick().await.unwrap();
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let (engine, _) = engine_with(seeded_store(36));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(engine.run(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("engine did not stop on shutdown signal")
            .unwrap();
    }

    #[test]
    fn window_is_one_day_out_and_one_day_wide() {
        let now = Utc::now();
        let (start, end) = notification_window(now);
        assert_eq!(start, (now + chrono::Duration::days(1)).to_rfc3339());
        assert_eq!(end, (now + chrono::Duration::days(2)).to_rfc3339());
    }
}
