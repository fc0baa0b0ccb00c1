//! # Invoice Draft
//!
//! Turns the bill on screen into the payload the backend turns into an
//! invoice.
//!
//! ## Snapshot Pattern
//! Each line freezes the price and tax the cashier saw. If the catalog
//! changes between scanning and submitting, the backend still receives
//! what was displayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::editor::BillEditor;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;
use crate::validation::validate_invoice;

/// One billable line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub line_total: Money,
}

/// Everything the backend needs to create the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// Idempotency key: resubmitting the same draft creates one invoice.
    #[ts(as = "String")]
    pub client_reference: Uuid,
    pub tenant_id: String,
    pub customer_id: Option<i64>,
    pub coupon_code: Option<String>,
    /// Points actually redeemed (already clamped).
    pub redeem_points: i64,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub total: Money,
    pub payable: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceDraft {
    /// Builds a draft from the current bill.
    ///
    /// Unresolved rows and rows with a blank or zero quantity are skipped.
    /// A bill with nothing left is rejected.
    pub fn from_editor(editor: &BillEditor, tenant_id: &str) -> CoreResult<Self> {
        let lines: Vec<InvoiceLine> = editor
            .rows()
            .iter()
            .filter(|row| row.effective_quantity() > 0)
            .filter_map(|row| {
                row.product_id.map(|product_id| InvoiceLine {
                    product_id,
                    name: row.name.clone(),
                    quantity: row.effective_quantity(),
                    unit_price: row.unit_price,
                    tax_rate: row.tax_rate,
                    line_total: row.line_total,
                })
            })
            .collect();

        if lines.is_empty() {
            return Err(CoreError::EmptyBill);
        }

        let summary = editor.summary();
        let draft = InvoiceDraft {
            client_reference: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            customer_id: editor.customer().map(|c| c.id),
            coupon_code: editor.coupon_code().map(str::to_string),
            redeem_points: summary.redeem_points,
            lines,
            subtotal: summary.subtotal,
            total: summary.base_total,
            payable: summary.final_payable,
            created_at: Utc::now(),
        };
        validate_invoice(&draft)?;
        Ok(draft)
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
