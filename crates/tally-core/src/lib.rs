//! # tally-core: Pure Billing Logic for Tally POS
//!
//! This crate holds the arithmetic and edit rules behind the billing
//! counter. Everything here is a pure function or plain in-memory state.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Billing screen / register console               │   │
//! │  │    code field ──► quantity ──► customer ──► redeem ──► submit   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐         │   │
//! │  │   │  money   │ │ catalog  │ │  editor  │ │   bill   │         │   │
//! │  │   │  Money   │ │ matching │ │ BillEdit │ │ totals   │         │   │
//! │  │   │ TaxRate  │ │ suggest  │ │ rows     │ │ redeem   │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tally-client (backend collaborator)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and lenient parsing
//! - [`types`] - Product, Customer, DiscountPreview, TaxRate
//! - [`line_item`] - A bill row
//! - [`bill`] - Subtotal, included tax, redeem clamping, payable
//! - [`catalog`] - Exact/scan matching and suggestions
//! - [`editor`] - The line-item edit protocol
//! - [`invoice`] - Draft sent to the backend on submission
//! - [`validation`] - Checks on outbound request input
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{BillEditor, Catalog, Money, Product, TaxRate};
//!
//! let catalog = Catalog::new(vec![Product {
//!     id: 1,
//!     name: "Masala Tea".to_string(),
//!     sku: "TEA-01".to_string(),
//!     barcode: None,
//!     selling_price: Money::from_cents(1000),
//!     tax_rate: TaxRate::from_bps(500),
//!     quantity_available: 12,
//! }]);
//!
//! let mut bill = BillEditor::new(catalog);
//! bill.edit_code(0, "TEA-01");
//! bill.edit_quantity(0, "2");
//!
//! let summary = bill.summary();
//! assert_eq!(summary.subtotal.to_string(), "20.00");
//! assert_eq!(summary.included_tax.to_string(), "1.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod catalog;
pub mod editor;
pub mod error;
pub mod invoice;
pub mod line_item;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{BillSummary, DiscountLine, DisplayTotals};
pub use catalog::Catalog;
pub use editor::BillEditor;
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{InvoiceDraft, InvoiceLine};
pub use line_item::LineItem;
pub use money::Money;
pub use types::*;
