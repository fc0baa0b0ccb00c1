//! # Bill Editor
//!
//! The in-memory bill a cashier works on: rows, live suggestions, the
//! selected customer, redeem request, coupon and server preview.
//!
//! ## Edit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action            Editor Operation         Effect              │
//! │  ──────────────            ────────────────         ──────              │
//! │  types in code field  ───► edit_code()         ───► resolve / suggest   │
//! │  clicks a suggestion  ───► select_suggestion() ───► row populated       │
//! │  types quantity       ───► edit_quantity()     ───► blank allowed       │
//! │  leaves quantity      ───► blur_quantity()     ───► blank/0 becomes 1   │
//! │  "+ Row"              ───► add_row()                                    │
//! │  row trash icon       ───► delete_row()        ───► last row is kept    │
//! │                                                                         │
//! │  Every row edit bumps the revision and drops a stale preview, so        │
//! │  totals fall back to local math until a fresh preview arrives.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Text edits never fail. Out-of-range row indices are ignored.

use serde::Serialize;
use tracing::debug;

use crate::bill::BillSummary;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::line_item::{parse_quantity, LineItem};
use crate::money::Money;
use crate::types::{Customer, DiscountPreview, Product};

/// Suggestions currently shown under one row's code field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub row: usize,
    pub products: Vec<Product>,
}

/// Mutable bill state with the line-item edit protocol.
#[derive(Debug, Clone)]
pub struct BillEditor {
    catalog: Catalog,
    rows: Vec<LineItem>,
    suggestions: Option<Suggestions>,
    customer: Option<Customer>,
    requested_redeem: i64,
    coupon_code: Option<String>,
    preview: Option<DiscountPreview>,
    revision: u64,
}

impl BillEditor {
    /// A new bill with a single empty row.
    pub fn new(catalog: Catalog) -> Self {
        BillEditor {
            catalog,
            rows: vec![LineItem::empty()],
            suggestions: None,
            customer: None,
            requested_redeem: 0,
            coupon_code: None,
            preview: None,
            revision: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rows(&self) -> &[LineItem] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&LineItem> {
        self.rows.get(index)
    }

    /// Suggestions for the row currently being typed into, if any.
    pub fn suggestions(&self) -> Option<&Suggestions> {
        self.suggestions.as_ref()
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Redeem points as typed, before clamping.
    pub fn requested_redeem(&self) -> i64 {
        self.requested_redeem
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn preview(&self) -> Option<&DiscountPreview> {
        self.preview.as_ref()
    }

    /// Edit counter; a preview computed for an older revision is stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current totals.
    pub fn summary(&self) -> BillSummary {
        BillSummary::compute(
            &self.rows,
            self.preview.as_ref(),
            self.customer.as_ref(),
            self.requested_redeem,
        )
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Swaps in a freshly loaded catalog. Rows keep their resolved values.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.suggestions = None;
    }

    // =========================================================================
    // Row Lifecycle
    // =========================================================================

    /// Appends an empty row and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(LineItem::empty());
        self.touch();
        self.rows.len() - 1
    }

    /// Removes a row. The last remaining row is never removed.
    pub fn delete_row(&mut self, index: usize) -> bool {
        if self.rows.len() <= 1 || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);

        self.suggestions = match self.suggestions.take() {
            Some(s) if s.row == index => None,
            Some(mut s) if s.row > index => {
                s.row -= 1;
                Some(s)
            }
            other => other,
        };
        self.touch();
        true
    }

    // =========================================================================
    // Code Field
    // =========================================================================

    /// Handles a keystroke (or a whole scan) in a row's code field.
    pub fn edit_code(&mut self, index: usize, text: &str) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        row.code = text.to_string();

        if text.trim().is_empty() {
            row.clear_derived();
            self.clear_suggestions_for(index);
            self.touch();
            return;
        }

        match self.catalog.resolve(text) {
            Some(product) => {
                debug!(row = index, product_id = product.id, "Code resolved");
                row.apply_product(product);
                self.clear_suggestions_for(index);
            }
            None => {
                row.clear_derived();
                self.suggestions = Some(Suggestions {
                    row: index,
                    products: self.catalog.suggestions(text),
                });
            }
        }
        self.touch();
    }

    /// Populates a row from a product picked in the suggestion list.
    pub fn select_suggestion(&mut self, index: usize, product_id: i64) -> CoreResult<()> {
        let rows = self.rows.len();
        let product = self
            .catalog
            .get(product_id)
            .ok_or(CoreError::ProductNotFound(product_id))?;
        let row = self
            .rows
            .get_mut(index)
            .ok_or(CoreError::RowOutOfRange { index, rows })?;

        row.code = product.sku.clone();
        row.apply_product(product);
        self.suggestions = None;
        self.touch();
        Ok(())
    }

    fn clear_suggestions_for(&mut self, index: usize) {
        if self.suggestions.as_ref().is_some_and(|s| s.row == index) {
            self.suggestions = None;
        }
    }

    // =========================================================================
    // Quantity Field
    // =========================================================================

    /// Handles a keystroke in a row's quantity field. Blank is allowed.
    pub fn edit_quantity(&mut self, index: usize, text: &str) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        row.quantity = parse_quantity(text);
        row.recompute();
        self.touch();
    }

    /// Focus left the quantity field: blank or zero becomes 1.
    pub fn blur_quantity(&mut self, index: usize) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        if row.effective_quantity() == 0 {
            row.quantity = Some(1);
            row.recompute();
            self.touch();
        }
    }

    // =========================================================================
    // Customer, Redeem, Coupon
    // =========================================================================

    pub fn select_customer(&mut self, customer: Customer) {
        debug!(customer_id = customer.id, points = customer.loyalty_points, "Customer selected");
        self.customer = Some(customer);
        self.touch();
    }

    /// Clears the customer and any redeem request tied to them.
    pub fn clear_customer(&mut self) {
        self.customer = None;
        self.requested_redeem = 0;
        self.touch();
    }

    /// Stores the typed redeem request; clamping happens in [`summary`].
    ///
    /// [`summary`]: BillEditor::summary
    pub fn set_redeem_points(&mut self, text: &str) {
        self.requested_redeem = Money::parse_lenient(text).major();
    }

    pub fn set_coupon_code(&mut self, code: Option<String>) {
        self.coupon_code = code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.touch();
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Installs a server preview computed for `revision`.
    ///
    /// Returns `false` and keeps local totals when the bill has changed
    /// since the request was made.
    pub fn apply_preview(&mut self, revision: u64, preview: DiscountPreview) -> bool {
        if revision != self.revision {
            debug!(
                requested_at = revision,
                current = self.revision,
                "Discarding stale discount preview"
            );
            return false;
        }
        self.preview = Some(preview);
        true
    }

    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Starts a fresh bill on the same catalog.
    pub fn reset(&mut self) {
        let revision = self.revision;
        *self = BillEditor::new(std::mem::take(&mut self.catalog));
        self.revision = revision + 1;
    }

    /// Clears a bill that was invoiced from `submitted`, a snapshot of the
    /// rows taken at `revision`.
    ///
    /// When nothing changed since the snapshot this is [`reset`]. Otherwise
    /// rows still identical to the snapshot are dropped and rows edited in
    /// the meantime (a scan landing mid-submit) carry over to the fresh
    /// bill. Returns the number of rows carried over.
    ///
    /// [`reset`]: BillEditor::reset
    pub fn settle_submitted(&mut self, revision: u64, submitted: &[LineItem]) -> usize {
        if revision == self.revision {
            self.reset();
            return 0;
        }

        let mut pending: Vec<&LineItem> = submitted.iter().collect();
        let mut rows = std::mem::take(&mut self.rows);
        rows.retain(|row| match pending.iter().position(|s| *s == row) {
            Some(i) => {
                pending.swap_remove(i);
                false
            }
            None => true,
        });

        let kept = rows.len();
        self.reset();
        if kept > 0 {
            debug!(kept, "Rows edited during submission carried over");
            self.rows = rows;
        }
        kept
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.preview = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{MembershipTier, TaxRate};

    fn product(id: i64, name: &str, sku: &str, barcode: Option<&str>, price: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            sku: sku.to_string(),
            barcode: barcode.map(str::to_string),
            selling_price: Money::from_cents(price),
            tax_rate: TaxRate::from_bps(500),
            quantity_available: 25,
        }
    }

    fn editor() -> BillEditor {
        BillEditor::new(Catalog::new(vec![
            product(1, "Green Tea", "TEA-GRN", Some("8901111111111"), 1000),
            product(2, "Green Apple", "APL-GRN", None, 80),
            product(3, "Oat Milk", "MILK-OAT", Some("8902222222222"), 350),
        ]))
    }

    #[test]
    fn test_starts_with_one_row() {
        let editor = editor();
        assert_eq!(editor.rows().len(), 1);
        assert!(editor.summary().final_payable.is_zero());
    }

    #[test]
    fn test_exact_sku_populates_and_clears_suggestions() {
        let mut editor = editor();
        editor.edit_code(0, "Gre");
        assert_eq!(editor.suggestions().map(|s| s.products.len()), Some(2));

        editor.edit_code(0, "TEA-GRN");
        let row = editor.row(0).unwrap();
        assert_eq!(row.name, "Green Tea");
        assert_eq!(row.unit_price.cents(), 1000);
        assert_eq!(row.tax_rate.bps(), 500);
        assert_eq!(row.product_id, Some(1));
        assert!(editor.suggestions().is_none());
    }

    #[test]
    fn test_unmatched_code_keeps_raw_text() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        editor.edit_code(0, "TEA-GR");

        let row = editor.row(0).unwrap();
        assert_eq!(row.code, "TEA-GR");
        assert!(row.name.is_empty());
        assert!(row.unit_price.is_zero());
        assert_eq!(row.product_id, None);
        assert_eq!(editor.suggestions().map(|s| s.row), Some(0));
    }

    #[test]
    fn test_empty_code_clears_suggestions() {
        let mut editor = editor();
        editor.edit_code(0, "milk");
        assert!(editor.suggestions().is_some());

        editor.edit_code(0, "");
        assert!(editor.suggestions().is_none());
        assert!(!editor.row(0).unwrap().is_resolved());
    }

    #[test]
    fn test_scanned_barcode_with_suffix() {
        let mut editor = editor();
        editor.edit_code(0, "8902222222222\n");
        assert_eq!(editor.row(0).unwrap().product_id, Some(3));
    }

    #[test]
    fn test_select_suggestion() {
        let mut editor = editor();
        editor.edit_code(0, "apple");
        editor.select_suggestion(0, 2).unwrap();

        let row = editor.row(0).unwrap();
        assert_eq!(row.code, "APL-GRN");
        assert_eq!(row.line_total.cents(), 80);
        assert!(editor.suggestions().is_none());
    }

    #[test]
    fn test_select_suggestion_errors() {
        let mut editor = editor();
        assert!(matches!(
            editor.select_suggestion(0, 99),
            Err(CoreError::ProductNotFound(99))
        ));
        assert!(matches!(
            editor.select_suggestion(5, 1),
            Err(CoreError::RowOutOfRange { index: 5, rows: 1 })
        ));
    }

    #[test]
    fn test_blank_quantity_then_blur() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        editor.edit_quantity(0, "");

        assert_eq!(editor.row(0).unwrap().quantity, None);
        assert!(editor.summary().subtotal.is_zero());

        editor.blur_quantity(0);
        let row = editor.row(0).unwrap();
        assert_eq!(row.quantity, Some(1));
        assert_eq!(row.line_total, row.unit_price);
    }

    #[test]
    fn test_zero_quantity_blur_resets() {
        let mut editor = editor();
        editor.edit_code(0, "MILK-OAT");
        editor.edit_quantity(0, "0");
        editor.blur_quantity(0);
        assert_eq!(editor.row(0).unwrap().quantity, Some(1));
    }

    #[test]
    fn test_invalid_quantity_degrades_to_zero() {
        let mut editor = editor();
        editor.edit_code(0, "MILK-OAT");
        editor.edit_quantity(0, "3x");
        assert_eq!(editor.row(0).unwrap().quantity, Some(0));
        assert!(editor.row(0).unwrap().line_total.is_zero());
    }

    #[test]
    fn test_delete_row_keeps_last() {
        let mut editor = editor();
        assert!(!editor.delete_row(0));

        let second = editor.add_row();
        assert_eq!(second, 1);
        assert!(editor.delete_row(0));
        assert_eq!(editor.rows().len(), 1);
        assert!(!editor.delete_row(3));
    }

    #[test]
    fn test_delete_row_shifts_suggestions() {
        let mut editor = editor();
        editor.add_row();
        editor.edit_code(1, "green");
        editor.delete_row(0);
        assert_eq!(editor.suggestions().map(|s| s.row), Some(0));

        editor.delete_row(0); // last row: no-op
        assert_eq!(editor.suggestions().map(|s| s.row), Some(0));
    }

    #[test]
    fn test_out_of_range_edits_ignored() {
        let mut editor = editor();
        let before = editor.revision();
        editor.edit_code(4, "TEA-GRN");
        editor.edit_quantity(4, "2");
        editor.blur_quantity(4);
        assert_eq!(editor.revision(), before);
    }

    #[test]
    fn test_redeem_tracks_customer() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        editor.edit_quantity(0, "3");
        editor.set_redeem_points("80");

        // no customer: nothing redeemable
        assert_eq!(editor.summary().redeem_points, 0);

        editor.select_customer(Customer::new(5, "Mei", "91234567", 50, MembershipTier::Silver));
        let summary = editor.summary();
        assert_eq!(summary.redeem_points, 50);
        assert!(summary.final_payable.is_zero());

        editor.clear_customer();
        assert_eq!(editor.requested_redeem(), 0);
    }

    #[test]
    fn test_stale_preview_rejected() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        let revision = editor.revision();
        editor.edit_quantity(0, "2");

        let preview = DiscountPreview {
            total: Some(Money::from_cents(900)),
            ..Default::default()
        };
        assert!(!editor.apply_preview(revision, preview.clone()));
        assert!(editor.preview().is_none());

        assert!(editor.apply_preview(editor.revision(), preview));
        assert_eq!(editor.summary().base_total.cents(), 900);

        editor.add_row();
        assert!(editor.preview().is_none());
        assert_eq!(editor.summary().base_total.cents(), 2000);
    }

    #[test]
    fn test_reset_keeps_catalog() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        editor.add_row();
        let revision = editor.revision();

        editor.reset();
        assert_eq!(editor.rows().len(), 1);
        assert_eq!(editor.catalog().len(), 3);
        assert!(editor.revision() > revision);
    }

    #[test]
    fn test_settle_unchanged_bill_resets() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        let (revision, snapshot) = (editor.revision(), editor.rows().to_vec());

        assert_eq!(editor.settle_submitted(revision, &snapshot), 0);
        assert_eq!(editor.rows().len(), 1);
        assert!(!editor.rows()[0].is_resolved());
    }

    #[test]
    fn test_settle_keeps_rows_edited_meanwhile() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        let customer = Customer::new(1, "Asha", "9876543210", 40, MembershipTier::Gold);
        editor.select_customer(customer);
        let (revision, snapshot) = (editor.revision(), editor.rows().to_vec());

        let row = editor.add_row();
        editor.edit_code(row, "MILK-OAT");

        assert_eq!(editor.settle_submitted(revision, &snapshot), 1);
        assert_eq!(editor.rows().len(), 1);
        assert_eq!(editor.rows()[0].product_id, Some(3));
        assert!(editor.customer().is_none());
        assert_eq!(editor.summary().subtotal.cents(), 350);
    }

    #[test]
    fn test_settle_keeps_overwritten_row() {
        let mut editor = editor();
        editor.edit_code(0, "TEA-GRN");
        let (revision, snapshot) = (editor.revision(), editor.rows().to_vec());

        editor.edit_code(0, "8902222222222");

        assert_eq!(editor.settle_submitted(revision, &snapshot), 1);
        assert_eq!(editor.rows()[0].product_id, Some(3));
    }

    #[test]
    fn test_coupon_code_trimmed() {
        let mut editor = editor();
        editor.set_coupon_code(Some("  SAVE10 ".to_string()));
        assert_eq!(editor.coupon_code(), Some("SAVE10"));
        editor.set_coupon_code(Some("   ".to_string()));
        assert_eq!(editor.coupon_code(), None);
    }
}
