//! Error types for the hush client.

use thiserror::Error;

/// Errors that can occur when using the hush client.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure (connection, timeout, body decoding)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the request as invalid
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The server answered with a status the client does not understand
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

impl Error {
    /// Returns `true` if the server rejected the request as invalid.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }
}
