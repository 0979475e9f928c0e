use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use medsched_core::AppointmentStatus;
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{
    Appointment, AppointmentDetail, NewAppointment, NewProvider, NewRequester, Provider,
    ProviderPatch, Requester, RequesterPatch,
};

/// Thread-safe handle to the record store.
///
/// Wraps a single SQLite connection in a `Mutex`. Each caller opens a
/// short-lived [`UnitOfWork`] which holds the lock for the duration of one
/// request or one reminder tick. The gateway and the reminder engine each
/// own their own `Store` over their own connection.
pub struct Store {
    db: Mutex<Connection>,
}

impl Store {
    /// Wrap an already-open connection, running idempotent schema init.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Open a unit of work. No transaction is started yet: the first
    /// mutation (or an explicit `begin`) opens one.
    pub fn unit_of_work(&self) -> UnitOfWork<'_> {
        UnitOfWork {
            conn: self.db.lock().unwrap(),
            boundary: Boundary::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    None,
    /// Opened automatically by the first mutation; closed by `save`.
    Implicit,
    /// Opened by `begin`; closed by `commit` or `rollback`.
    Explicit,
}

/// Atomic grouping of store operations.
///
/// Mutations execute inside the open transaction, so they are visible to
/// reads within the same unit of work but invisible to other units until
/// commit. Dropping without commit rolls back — a unit of work can never
/// leak an open transaction.
pub struct UnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    boundary: Boundary,
}

impl UnitOfWork<'_> {
    /// Open an explicit transaction boundary.
    pub fn begin(&mut self) -> Result<()> {
        if self.boundary != Boundary::None {
            return Err(StoreError::Transaction(
                "transaction already open".to_string(),
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.boundary = Boundary::Explicit;
        Ok(())
    }

    /// Persist pending changes. Closes an implicit boundary; inside an
    /// explicit one the changes are already staged and durability arrives
    /// at `commit`.
    pub fn save(&mut self) -> Result<()> {
        if self.boundary == Boundary::Implicit {
            self.conn.execute_batch("COMMIT")?;
            self.boundary = Boundary::None;
        }
        Ok(())
    }

    /// Make every mutation since `begin` durable together.
    pub fn commit(mut self) -> Result<()> {
        if self.boundary != Boundary::None {
            self.conn.execute_batch("COMMIT")?;
            self.boundary = Boundary::None;
        }
        Ok(())
    }

    /// Discard every pending mutation and release the transaction.
    pub fn rollback(mut self) -> Result<()> {
        if self.boundary != Boundary::None {
            self.conn.execute_batch("ROLLBACK")?;
            self.boundary = Boundary::None;
        }
        Ok(())
    }

    /// Mutations auto-open a boundary so a lone insert still commits
    /// atomically via `save`.
    fn ensure_boundary(&mut self) -> Result<()> {
        if self.boundary == Boundary::None {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.boundary = Boundary::Implicit;
        }
        Ok(())
    }

    // ── requesters ───────────────────────────────────────────────────────────

    pub fn create_requester(&mut self, new: NewRequester) -> Result<Requester> {
        let now = Utc::now().to_rfc3339();
        let requester = Requester {
            id: Uuid::now_v7().to_string(),
            name: new.name,
            birth_date: new.birth_date,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            created_at: now,
        };
        self.ensure_boundary()?;
        self.conn
            .execute(
                "INSERT INTO requesters (id, name, birth_date, email, phone, password_hash, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)",
                params![
                    requester.id,
                    requester.name,
                    requester.birth_date,
                    requester.email,
                    requester.phone,
                    requester.password_hash,
                    requester.created_at,
                ],
            )
            .map_err(|e| map_unique(e, &requester.email))?;
        debug!(requester_id = %requester.id, "requester row staged");
        Ok(requester)
    }

    /// Load by primary key. Returns None instead of an error when absent so
    /// callers decide whether missing is exceptional in their context.
    pub fn requester_by_id(&self, id: &str) -> Result<Option<Requester>> {
        let mut stmt = self.conn.prepare(REQUESTER_SELECT)?;
        match stmt.query_row(params![id], row_to_requester) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Login-path lookup.
    pub fn requester_by_email(&self, email: &str) -> Result<Option<Requester>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, birth_date, email, phone, password_hash, created_at
             FROM requesters WHERE email = ?1",
        )?;
        match stmt.query_row(params![email], row_to_requester) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Apply a partial update field-by-field and persist the result.
    pub fn update_requester(&mut self, id: &str, patch: &RequesterPatch) -> Result<Requester> {
        let mut requester = self
            .requester_by_id(id)?
            .ok_or_else(|| StoreError::not_found("requester", id))?;
        patch.apply(&mut requester);
        self.ensure_boundary()?;
        self.conn
            .execute(
                "UPDATE requesters SET name=?2, birth_date=?3, email=?4, phone=?5 WHERE id=?1",
                params![
                    requester.id,
                    requester.name,
                    requester.birth_date,
                    requester.email,
                    requester.phone,
                ],
            )
            .map_err(|e| map_unique(e, &requester.email))?;
        Ok(requester)
    }

    /// Provider-facing directory of all requesters.
    pub fn list_requesters(&self) -> Result<Vec<Requester>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, birth_date, email, phone, password_hash, created_at
             FROM requesters ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map([], row_to_requester)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── providers ────────────────────────────────────────────────────────────

    pub fn create_provider(&mut self, new: NewProvider) -> Result<Provider> {
        let now = Utc::now().to_rfc3339();
        let provider = Provider {
            id: Uuid::now_v7().to_string(),
            name: new.name,
            specialization: new.specialization,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            created_at: now,
        };
        self.ensure_boundary()?;
        self.conn
            .execute(
                "INSERT INTO providers (id, name, specialization, email, phone, password_hash, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)",
                params![
                    provider.id,
                    provider.name,
                    provider.specialization,
                    provider.email,
                    provider.phone,
                    provider.password_hash,
                    provider.created_at,
                ],
            )
            .map_err(|e| map_unique(e, &provider.email))?;
        debug!(provider_id = %provider.id, "provider row staged");
        Ok(provider)
    }

    pub fn provider_by_id(&self, id: &str) -> Result<Option<Provider>> {
        let mut stmt = self.conn.prepare(PROVIDER_SELECT)?;
        match stmt.query_row(params![id], row_to_provider) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub fn provider_by_email(&self, email: &str) -> Result<Option<Provider>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, specialization, email, phone, password_hash, created_at
             FROM providers WHERE email = ?1",
        )?;
        match stmt.query_row(params![email], row_to_provider) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub fn update_provider(&mut self, id: &str, patch: &ProviderPatch) -> Result<Provider> {
        let mut provider = self
            .provider_by_id(id)?
            .ok_or_else(|| StoreError::not_found("provider", id))?;
        patch.apply(&mut provider);
        self.ensure_boundary()?;
        self.conn
            .execute(
                "UPDATE providers SET name=?2, specialization=?3, email=?4, phone=?5 WHERE id=?1",
                params![
                    provider.id,
                    provider.name,
                    provider.specialization,
                    provider.email,
                    provider.phone,
                ],
            )
            .map_err(|e| map_unique(e, &provider.email))?;
        Ok(provider)
    }

    // ── appointments ─────────────────────────────────────────────────────────

    /// Insert a new Scheduled appointment. Both party references must
    /// resolve at creation time; they are immutable afterwards.
    pub fn create_appointment(&mut self, new: NewAppointment) -> Result<Appointment> {
        if self.requester_by_id(&new.requester_id)?.is_none() {
            return Err(StoreError::not_found("requester", &new.requester_id));
        }
        if self.provider_by_id(&new.provider_id)?.is_none() {
            return Err(StoreError::not_found("provider", &new.provider_id));
        }

        let now = Utc::now().to_rfc3339();
        let appointment = Appointment {
            id: Uuid::now_v7().to_string(),
            requester_id: new.requester_id,
            provider_id: new.provider_id,
            scheduled_at: new.scheduled_at,
            reason: new.reason,
            status: AppointmentStatus::Scheduled,
            version: 0,
            created_at: now,
        };
        self.ensure_boundary()?;
        self.conn.execute(
            "INSERT INTO appointments
                (id, requester_id, provider_id, scheduled_at, reason, status, version, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,0,?7)",
            params![
                appointment.id,
                appointment.requester_id,
                appointment.provider_id,
                appointment.scheduled_at,
                appointment.reason,
                appointment.status.to_string(),
                appointment.created_at,
            ],
        )?;
        debug!(appointment_id = %appointment.id, "appointment row staged");
        Ok(appointment)
    }

    pub fn appointment_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, requester_id, provider_id, scheduled_at, reason, status, version, created_at
             FROM appointments WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], row_to_appointment) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Single appointment joined with both parties.
    pub fn appointment_detail(&self, id: &str) -> Result<Option<AppointmentDetail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DETAIL_SELECT} WHERE a.id = ?1"))?;
        match stmt.query_row(params![id], row_to_detail) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub fn appointments_for_requester(&self, requester_id: &str) -> Result<Vec<AppointmentDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DETAIL_SELECT} WHERE a.requester_id = ?1 ORDER BY a.scheduled_at"
        ))?;
        let rows = stmt
            .query_map(params![requester_id], row_to_detail)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn appointments_for_provider(&self, provider_id: &str) -> Result<Vec<AppointmentDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DETAIL_SELECT} WHERE a.provider_id = ?1 ORDER BY a.scheduled_at"
        ))?;
        let rows = stmt
            .query_map(params![provider_id], row_to_detail)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Version-checked status write. Zero rows changed means either the
    /// record vanished or another unit of work committed a transition first
    /// — the two cases surface as distinct errors.
    pub fn update_status(
        &mut self,
        id: &str,
        expected_version: i64,
        new_status: AppointmentStatus,
    ) -> Result<()> {
        self.ensure_boundary()?;
        let n = self.conn.execute(
            "UPDATE appointments SET status = ?2, version = version + 1
             WHERE id = ?1 AND version = ?3",
            params![id, new_status.to_string(), expected_version],
        )?;
        if n == 0 {
            return match self.appointment_by_id(id)? {
                Some(_) => Err(StoreError::StaleVersion {
                    id: id.to_string(),
                    expected: expected_version,
                }),
                None => Err(StoreError::not_found("appointment", id)),
            };
        }
        Ok(())
    }

    // ── reminder scan ────────────────────────────────────────────────────────

    /// Scheduled appointments with `start <= scheduled_at < end`.
    /// RFC3339 UTC strings compare lexicographically, same trick the
    /// window bounds rely on everywhere else in this crate.
    pub fn scheduled_in_window(&self, start: &str, end: &str) -> Result<Vec<AppointmentDetail>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DETAIL_SELECT}
             WHERE a.status = 'scheduled' AND a.scheduled_at >= ?1 AND a.scheduled_at < ?2
             ORDER BY a.scheduled_at"
        ))?;
        let rows = stmt
            .query_map(params![start, end], row_to_detail)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Record that a reminder went out for `(appointment, day)`. Returns
    /// true when this call claimed the slot — the caller should only notify
    /// on true, which makes delivery at-most-once per appointment per day.
    pub fn mark_reminded(&mut self, appointment_id: &str, day: &str) -> Result<bool> {
        self.ensure_boundary()?;
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO reminder_log (appointment_id, sent_on, sent_at)
             VALUES (?1, ?2, ?3)",
            params![appointment_id, day, Utc::now().to_rfc3339()],
        )?;
        Ok(n == 1)
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        // Disposal without commit must not leave a transaction open.
        if self.boundary != Boundary::None {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

// ── row mappers ───────────────────────────────────────────────────────────────

const REQUESTER_SELECT: &str =
    "SELECT id, name, birth_date, email, phone, password_hash, created_at
     FROM requesters WHERE id = ?1";

const PROVIDER_SELECT: &str =
    "SELECT id, name, specialization, email, phone, password_hash, created_at
     FROM providers WHERE id = ?1";

const DETAIL_SELECT: &str =
    "SELECT a.id, a.requester_id, a.provider_id, a.scheduled_at, a.reason, a.status,
            a.version, a.created_at,
            r.name, r.email, p.name, p.email, p.specialization
     FROM appointments a
     JOIN requesters r ON r.id = a.requester_id
     JOIN providers  p ON p.id = a.provider_id";

fn row_to_requester(row: &rusqlite::Row<'_>) -> rusqlite::Result<Requester> {
    Ok(Requester {
        id: row.get(0)?,
        name: row.get(1)?,
        birth_date: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        password_hash: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_provider(row: &rusqlite::Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        password_hash: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_appointment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Appointment> {
    let status = AppointmentStatus::from_str(&row.get::<_, String>(5)?).unwrap_or_default();
    Ok(Appointment {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        provider_id: row.get(2)?,
        scheduled_at: row.get(3)?,
        reason: row.get(4)?,
        status,
        version: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn row_to_detail(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentDetail> {
    Ok(AppointmentDetail {
        appointment: row_to_appointment(row)?,
        requester_name: row.get(8)?,
        requester_email: row.get(9)?,
        provider_name: row.get(10)?,
        provider_email: row.get(11)?,
        provider_specialization: row.get(12)?,
    })
}

/// SQLite reports UNIQUE violations as constraint failures; both email
/// columns are the only UNIQUE constraints in this schema.
fn map_unique(e: rusqlite::Error, email: &str) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Database(e),
    }
}
