//! Error types for enforcer-client.

use thiserror::Error;

/// All errors that can arise from talking to the remote directory.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure (DNS, connect, TLS, timeout).
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The remote answered with a status the operation does not accept.
    #[error("[{status}] {method} {url}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// HTTP status of the failed call, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
