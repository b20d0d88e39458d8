//! Error types for source-control API access.

use thiserror::Error;

/// Errors that can occur while talking to the source-control API.
#[derive(Error, Debug)]
pub enum ScmError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The API answered with a non-success status code.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded into the expected shape.
    #[error("Response decoding failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ScmError {
    fn from(err: reqwest::Error) -> Self {
        ScmError::Http(err.to_string())
    }
}
