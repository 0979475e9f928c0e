use rusqlite::{Connection, Result};

/// Initialise all tables for the record store. Safe to call on every
/// startup — CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_requesters_table(conn)?;
    create_providers_table(conn)?;
    create_appointments_table(conn)?;
    create_reminder_log_table(conn)?;
    Ok(())
}

fn create_requesters_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS requesters (
            id            TEXT PRIMARY KEY NOT NULL,
            name          TEXT NOT NULL,
            birth_date    TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            phone         TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );",
    )
}

fn create_providers_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS providers (
            id             TEXT PRIMARY KEY NOT NULL,
            name           TEXT NOT NULL,
            specialization TEXT NOT NULL,
            email          TEXT NOT NULL UNIQUE,
            phone          TEXT NOT NULL,
            password_hash  TEXT NOT NULL,
            created_at     TEXT NOT NULL
        );",
    )
}

fn create_appointments_table(conn: &Connection) -> Result<()> {
    // idx_appointments_window serves the hourly reminder scan; the two
    // party indexes serve the self-list endpoints.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS appointments (
            id           TEXT PRIMARY KEY NOT NULL,
            requester_id TEXT NOT NULL REFERENCES requesters(id),
            provider_id  TEXT NOT NULL REFERENCES providers(id),
            scheduled_at TEXT NOT NULL,
            reason       TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'scheduled',
            version      INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_appointments_requester
            ON appointments (requester_id, scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_provider
            ON appointments (provider_id, scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_window
            ON appointments (status, scheduled_at);",
    )
}

fn create_reminder_log_table(conn: &Connection) -> Result<()> {
    // UNIQUE(appointment_id, sent_on) is the reminder dedup: one
    // notification per appointment per calendar day, enforced at the DB
    // level so concurrent ticks cannot double-send.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS reminder_log (
            appointment_id TEXT NOT NULL REFERENCES appointments(id),
            sent_on        TEXT NOT NULL,
            sent_at        TEXT NOT NULL,
            UNIQUE(appointment_id, sent_on)
        );",
    )
}
