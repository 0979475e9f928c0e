use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("store error during scan: {0}")]
    Store(#[from] medsched_store::StoreError),

    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, ReminderError>;
