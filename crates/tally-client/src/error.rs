//! Client error types

use tally_core::ValidationError;
use thiserror::Error;

/// Errors talking to the billing backend.
///
/// No variant is retried inside the client; the register decides what to
/// tell the cashier.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the expected JSON.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Configured base URL cannot be used.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Request input rejected before sending.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Whether the failure is on the network or backend side rather than
    /// in what the cashier entered.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::Decode(_)
        )
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClientError::Status {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 503: maintenance");
        assert!(err.is_network());

        let err: ClientError = ValidationError::Required {
            field: "phone".to_string(),
        }
        .into();
        assert!(!err.is_network());
    }
}
