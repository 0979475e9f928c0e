use thiserror::Error;

/// All store-layer errors. Kept separate from the gateway's response types
/// so HTTP status mapping lives in one boundary layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Version-checked status write lost the race: someone else committed a
    /// transition first.
    #[error("Appointment {id} was modified concurrently (expected version {expected})")]
    StaleVersion { id: String, expected: i64 },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
