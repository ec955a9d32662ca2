//! Session error types

use thiserror::Error;

/// Token storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the session service
#[derive(Error, Debug)]
pub enum SessionError {
    /// The login call itself failed (network, HTTP status or unreadable body)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The token could not be persisted
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;
