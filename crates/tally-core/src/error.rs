//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Invoice / bill rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-client errors (separate crate)                                  │
//! │  └── ClientError      - Backend request failures                       │
//! │                                                                         │
//! │  register errors (in app)                                              │
//! │  └── AppError         - What the console reports                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bill arithmetic and row editing never produce these errors: bad numeric
//! input degrades to zero and redemption is clamped. Errors only appear at
//! the edges, when a bill is turned into an invoice or a request to the
//! backend is prepared.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected before talking to the backend.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A row index that does not exist on the bill.
    #[error("Row {index} does not exist (bill has {rows} rows)")]
    RowOutOfRange { index: usize, rows: usize },

    /// A product id that is not in the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// The bill has nothing that can be invoiced.
    #[error("Bill has no billable lines")]
    EmptyBill,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
