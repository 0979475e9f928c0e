use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password both collapse here so the response
    /// leaks nothing about which one it was.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid session token: {0}")]
    InvalidToken(&'static str),

    #[error("session token expired")]
    TokenExpired,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
