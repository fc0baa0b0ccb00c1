//! # Line Items
//!
//! One row of the bill: what the cashier typed, the product it resolved
//! to, and the computed line total.
//!
//! ## Row States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_row()          code typed          product resolved                │
//! │  ┌─────────┐        ┌─────────┐         ┌──────────────────┐            │
//! │  │ empty   │──────► │ raw code│ ──────► │ name/price/tax   │            │
//! │  │ qty = 1 │        │ no price│ ◄────── │ product_id set   │            │
//! │  └─────────┘        └─────────┘ no match└──────────────────┘            │
//! │                                                                         │
//! │  Quantity may be blank (None) while the cashier retypes it.             │
//! │  A blank quantity contributes 0 until blur resets it to 1.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, TaxRate};

/// Parses quantity text typed by the cashier.
///
/// - blank text is `None` (the transient "clear and retype" state)
/// - whole units only; fractions truncate (`"2.9"` is 2)
/// - malformed or negative text degrades to `Some(0)`
///
/// ```rust
/// use tally_core::line_item::parse_quantity;
///
/// assert_eq!(parse_quantity(""), None);
/// assert_eq!(parse_quantity("3"), Some(3));
/// assert_eq!(parse_quantity("2.9"), Some(2));
/// assert_eq!(parse_quantity("two"), Some(0));
/// ```
pub fn parse_quantity(text: &str) -> Option<i64> {
    if text.trim().is_empty() {
        return None;
    }
    Some(Money::parse_lenient(text).major().max(0))
}

/// A single bill row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Raw text typed or scanned into the code field.
    pub code: String,

    /// Resolved product name; empty while unresolved.
    pub name: String,

    /// `None` while the quantity field is blank.
    pub quantity: Option<i64>,

    pub unit_price: Money,

    pub tax_rate: TaxRate,

    /// Always `quantity × unit_price` (blank quantity counts as 0).
    pub line_total: Money,

    /// Backend product this row resolved to.
    pub product_id: Option<i64>,
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem::empty()
    }
}

impl LineItem {
    /// A fresh input row: no code, no product, quantity 1.
    pub fn empty() -> Self {
        LineItem {
            code: String::new(),
            name: String::new(),
            quantity: Some(1),
            unit_price: Money::zero(),
            tax_rate: TaxRate::zero(),
            line_total: Money::zero(),
            product_id: None,
        }
    }

    /// Quantity used in arithmetic: blank counts as 0.
    #[inline]
    pub fn effective_quantity(&self) -> i64 {
        self.quantity.unwrap_or(0).max(0)
    }

    /// Recomputes `line_total` from quantity and price.
    pub fn recompute(&mut self) {
        self.line_total = self.unit_price.multiply_quantity(self.effective_quantity());
    }

    /// Copies the product's derived fields onto the row.
    ///
    /// The raw code is left alone; a blank quantity becomes 1 so a freshly
    /// resolved product always shows a price.
    pub fn apply_product(&mut self, product: &Product) {
        self.name = product.name.clone();
        self.unit_price = product.selling_price;
        self.tax_rate = product.tax_rate;
        self.product_id = Some(product.id);
        if self.quantity.is_none() {
            self.quantity = Some(1);
        }
        self.recompute();
    }

    /// Drops everything derived from a product but keeps the typed code.
    pub fn clear_derived(&mut self) {
        self.name.clear();
        self.unit_price = Money::zero();
        self.tax_rate = TaxRate::zero();
        self.product_id = None;
        self.recompute();
    }

    pub fn is_resolved(&self) -> bool {
        self.product_id.is_some()
    }

    /// Tax contained in this row, in cent-basis-points (cents × bps).
    ///
    /// Kept unrounded so a bill can sum rows exactly and round once.
    /// Saturates at the `i128` bounds for runaway prices or quantities.
    pub fn included_tax_basis(&self) -> i128 {
        i128::from(self.unit_price.cents())
            .saturating_mul(i128::from(self.tax_rate.bps()))
            .saturating_mul(i128::from(self.effective_quantity()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
