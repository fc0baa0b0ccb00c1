//! # Register Error Type
//!
//! Unified error for everything the console can report.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  ConfigError ──┐                                                        │
//! │  ClientError ──┤                                                        │
//! │  CoreError   ──┼──► AppError ──► user_message() ──► console             │
//! │  io::Error   ──┘                   │                                    │
//! │                                    └──► full error logged via tracing   │
//! │                                                                         │
//! │  Network and backend failures are shown as one generic notice; the     │
//! │  details go to the log only.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_client::ClientError;
use tally_core::CoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Notice shown for any failure talking to the backend.
pub const NETWORK_FAILURE_NOTICE: &str = "Could not reach the billing server. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A console command that could not be understood.
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::Usage(message.into())
    }

    /// What the cashier sees.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Client(e) if e.is_network() => {
                tracing::warn!(error = %e, "Backend request failed");
                NETWORK_FAILURE_NOTICE.to_string()
            }
            AppError::Client(ClientError::NotFound(_)) => "Not found.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
