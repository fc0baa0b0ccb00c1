//! # tally-client: Billing Backend Collaborator
//!
//! Async access to the remote billing backend: catalog, customer lookup,
//! discount preview and invoice creation.
//!
//! The backend is opaque. This crate only shapes requests, maps wire JSON
//! into [`tally_core`] types and reports failures; it never retries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tally_client::{BackendConfig, BillingBackend, HttpBackend};
//!
//! # async fn demo() -> tally_client::ClientResult<()> {
//! let backend = HttpBackend::new(&BackendConfig {
//!     base_url: "https://billing.example.com/api".to_string(),
//!     tenant_id: "store-42".to_string(),
//!     timeout: Duration::from_secs(10),
//! })?;
//! let products = backend.fetch_catalog().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod dto;
pub mod error;

pub use backend::{BackendConfig, BillingBackend, HttpBackend, TENANT_HEADER};
pub use dto::{InvoiceReceipt, PreviewRequest};
pub use error::{ClientError, ClientResult};
