//! `medsched-auth` — credential hashing and session-token issue/verify.
//!
//! Two independent pieces: argon2 password hashing for stored credentials,
//! and an HMAC-SHA256 signed bearer token carrying caller id + role. The
//! token is opaque to clients; only this crate can mint or read one.

pub mod error;
pub mod password;
pub mod token;

pub use error::{AuthError, Result};
pub use token::TokenSigner;
