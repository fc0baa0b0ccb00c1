//! # Bill Computation
//!
//! Every number shown to the cashier is derived here from the rows, the
//! optional server preview and the redeem request.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rows ──► compute_subtotal ─────────┐                                   │
//! │   │                                 ▼                                   │
//! │   └────► compute_included_tax   resolve_display_totals ◄── preview?     │
//! │          (informational)            │                                   │
//! │                                     ▼ base total                        │
//! │  requested points ─► clamp_redeem ─► compute_final_payable ─► payable   │
//! │  customer balance ──┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions are total: there is no input for which they fail or
//! panic. Redemption above the balance is clamped silently and the payable
//! amount never goes below zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::line_item::LineItem;
use crate::money::Money;
use crate::types::{Customer, DiscountKind, DiscountPreview};

/// Sum of `quantity × unit_price` over all rows; blank quantities count as 0.
///
/// ```rust
/// use tally_core::bill::compute_subtotal;
///
/// assert!(compute_subtotal(&[]).is_zero());
/// ```
pub fn compute_subtotal(items: &[LineItem]) -> Money {
    items
        .iter()
        .map(|item| item.unit_price.multiply_quantity(item.effective_quantity()))
        .sum()
}

/// Tax already contained in the prices, for display only.
///
/// Rows are summed in cent-basis-point units and rounded half-up once, so
/// many small lines do not accumulate rounding error.
pub fn compute_included_tax(items: &[LineItem]) -> Money {
    let basis = items
        .iter()
        .map(LineItem::included_tax_basis)
        .fold(0i128, i128::saturating_add);
    let cents = basis.saturating_add(5_000).div_euclid(10_000);
    let cents = cents.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
    Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
}

/// A discount line to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountLine {
    pub kind: DiscountKind,
    pub amount: Money,
}

/// Subtotal, total and visible discounts after reconciling with a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTotals {
    pub subtotal: Money,
    pub total: Money,
    /// Only categories with a positive amount, in display order.
    pub discounts: Vec<DiscountLine>,
    pub points_earned: Option<i64>,
    /// Whether the numbers came from the server preview.
    pub from_preview: bool,
}

/// Reconciles local math with the optional server preview.
///
/// The preview wins field by field; a field it omits falls back to the
/// local subtotal. Discounts that are missing or not positive are hidden.
pub fn resolve_display_totals(
    items: &[LineItem],
    preview: Option<&DiscountPreview>,
) -> DisplayTotals {
    let local = compute_subtotal(items);

    match preview {
        Some(preview) => DisplayTotals {
            subtotal: preview.subtotal.unwrap_or(local),
            total: preview.total.unwrap_or(local),
            discounts: DiscountKind::ALL
                .iter()
                .filter_map(|&kind| {
                    preview
                        .discount(kind)
                        .filter(Money::is_positive)
                        .map(|amount| DiscountLine { kind, amount })
                })
                .collect(),
            points_earned: preview.points_earned,
            from_preview: true,
        },
        None => DisplayTotals {
            subtotal: local,
            total: local,
            discounts: Vec::new(),
            points_earned: None,
            from_preview: false,
        },
    }
}

/// Clamps requested redeem points into `[0, balance]`.
///
/// No customer means no balance, so nothing can be redeemed.
///
/// ```rust
/// use tally_core::bill::clamp_redeem;
///
/// assert_eq!(clamp_redeem(80, Some(50)), 50);
/// assert_eq!(clamp_redeem(-5, Some(50)), 0);
/// assert_eq!(clamp_redeem(10, None), 0);
/// ```
pub fn clamp_redeem(requested: i64, balance: Option<i64>) -> i64 {
    let balance = balance.unwrap_or(0).max(0);
    requested.max(0).min(balance)
}

/// `max(base_total − redeemed points, 0)`, one point being one currency unit.
///
/// ```rust
/// use tally_core::bill::compute_final_payable;
/// use tally_core::Money;
///
/// let payable = compute_final_payable(Money::from_major(30), 50);
/// assert!(payable.is_zero());
/// ```
pub fn compute_final_payable(base_total: Money, clamped_redeem: i64) -> Money {
    (base_total - Money::from_major(clamped_redeem)).non_negative()
}

/// Everything the billing screen displays for the current bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub subtotal: Money,
    pub included_tax: Money,
    pub discounts: Vec<DiscountLine>,
    pub base_total: Money,
    /// Points actually redeemed after clamping.
    pub redeem_points: i64,
    /// Monetary value of `redeem_points`.
    pub redeem_value: Money,
    pub final_payable: Money,
    pub points_earned: Option<i64>,
    pub from_preview: bool,
}

impl BillSummary {
    /// Computes the summary. Pure: same inputs, same summary.
    pub fn compute(
        items: &[LineItem],
        preview: Option<&DiscountPreview>,
        customer: Option<&Customer>,
        requested_redeem: i64,
    ) -> Self {
        let totals = resolve_display_totals(items, preview);
        let redeem_points = clamp_redeem(requested_redeem, customer.map(|c| c.loyalty_points));
        let final_payable = compute_final_payable(totals.total, redeem_points);

        BillSummary {
            subtotal: totals.subtotal,
            included_tax: compute_included_tax(items),
            discounts: totals.discounts,
            base_total: totals.total,
            redeem_points,
            redeem_value: Money::from_major(redeem_points),
            final_payable,
            points_earned: totals.points_earned,
            from_preview: totals.from_preview,
        }
    }

    /// Amount shown for one discount category, zero when hidden.
    pub fn discount(&self, kind: DiscountKind) -> Money {
        self.discounts
            .iter()
            .find(|line| line.kind == kind)
            .map(|line| line.amount)
            .unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MembershipTier, TaxRate};

    fn row(qty: Option<i64>, price_cents: i64, tax_bps: u32) -> LineItem {
        let mut item = LineItem {
            code: "X".to_string(),
            name: "Item".to_string(),
            quantity: qty,
            unit_price: Money::from_cents(price_cents),
            tax_rate: TaxRate::from_bps(tax_bps),
            line_total: Money::zero(),
            product_id: Some(1),
        };
        item.recompute();
        item
    }

    fn customer(points: i64) -> Customer {
        Customer::new(9, "Ravi", "9000000001", points, MembershipTier::Gold)
    }

    #[test]
    fn test_single_row_without_preview() {
        let rows = vec![row(Some(2), 1000, 500)];

        assert_eq!(compute_subtotal(&rows).to_string(), "20.00");
        assert_eq!(compute_included_tax(&rows).to_string(), "1.00");

        let totals = resolve_display_totals(&rows, None);
        assert_eq!(totals.total.to_string(), "20.00");
        assert!(totals.discounts.is_empty());
        assert!(!totals.from_preview);
    }

    #[test]
    fn test_subtotal_with_blank_quantity() {
        let rows = vec![row(Some(3), 199, 0), row(None, 5000, 0)];
        assert_eq!(compute_subtotal(&rows).cents(), 597);
    }

    #[test]
    fn test_included_tax_rounds_once() {
        // 3 rows of 0.33 at 1.5%: 0.00495 each, 0.01485 total
        let rows = vec![row(Some(1), 33, 150), row(Some(1), 33, 150), row(Some(1), 33, 150)];
        assert_eq!(compute_included_tax(&rows).cents(), 1);
    }

    #[test]
    fn test_included_tax_saturates_on_huge_rows() {
        let rows = vec![
            row(Some(2_000_000_000_000_000), i64::MAX, 10_000),
            row(Some(i64::MAX), i64::MAX, 10_000),
        ];
        assert_eq!(compute_included_tax(&rows).cents(), i64::MAX);

        let rows = vec![row(Some(i64::MAX), i64::MIN, 10_000)];
        assert_eq!(compute_included_tax(&rows).cents(), i64::MIN);
    }

    #[test]
    fn test_preview_takes_precedence() {
        let rows = vec![row(Some(2), 1000, 500)];
        let preview = DiscountPreview {
            subtotal: Some(Money::from_cents(2000)),
            total: Some(Money::from_cents(1700)),
            item_discount: Some(Money::from_cents(200)),
            bill_discount: Some(Money::zero()),
            coupon_discount: Some(Money::from_cents(100)),
            membership_discount: None,
            points_earned: Some(17),
        };

        let totals = resolve_display_totals(&rows, Some(&preview));
        assert_eq!(totals.total.cents(), 1700);
        assert_eq!(
            totals.discounts,
            vec![
                DiscountLine {
                    kind: DiscountKind::Item,
                    amount: Money::from_cents(200)
                },
                DiscountLine {
                    kind: DiscountKind::Coupon,
                    amount: Money::from_cents(100)
                },
            ]
        );
        assert_eq!(totals.points_earned, Some(17));
        assert!(totals.from_preview);
    }

    #[test]
    fn test_preview_missing_fields_fall_back() {
        let rows = vec![row(Some(1), 450, 0)];
        let preview = DiscountPreview {
            membership_discount: Some(Money::from_cents(-30)),
            ..Default::default()
        };

        let totals = resolve_display_totals(&rows, Some(&preview));
        assert_eq!(totals.subtotal.cents(), 450);
        assert_eq!(totals.total.cents(), 450);
        assert!(totals.discounts.is_empty());
    }

    #[test]
    fn test_clamp_redeem() {
        assert_eq!(clamp_redeem(80, Some(50)), 50);
        assert_eq!(clamp_redeem(20, Some(50)), 20);
        assert_eq!(clamp_redeem(-1, Some(50)), 0);
        assert_eq!(clamp_redeem(20, Some(-10)), 0);
        assert_eq!(clamp_redeem(20, None), 0);
    }

    #[test]
    fn test_final_payable_never_negative() {
        assert_eq!(compute_final_payable(Money::from_major(30), 50), Money::zero());
        assert_eq!(
            compute_final_payable(Money::from_major(30), 12).cents(),
            1800
        );
    }

    #[test]
    fn test_summary_combines_everything() {
        let rows = vec![row(Some(2), 1000, 500)];
        let summary = BillSummary::compute(&rows, None, Some(&customer(50)), 80);

        assert_eq!(summary.base_total.cents(), 2000);
        assert_eq!(summary.redeem_points, 50);
        assert_eq!(summary.redeem_value.cents(), 5000);
        assert!(summary.final_payable.is_zero());
        assert!(summary.discount(DiscountKind::Bill).is_zero());
    }

    #[test]
    fn test_summary_is_idempotent() {
        let rows = vec![row(Some(2), 1000, 500), row(None, 300, 1200)];
        let first = BillSummary::compute(&rows, None, Some(&customer(5)), 3);
        let second = BillSummary::compute(&rows, None, Some(&customer(5)), 3);
        assert_eq!(first, second);
    }
}
