//! API Error Types
//!
//! Failures of outgoing calls, as seen by the screens.

use thiserror::Error;

/// Errors from calls made through the request authenticator
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or transport failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected our credentials; the session has been dropped
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Body did not match the expected schema
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Malformed(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
