//! # Domain Types
//!
//! Core domain types shared by the bill engine, the backend client and the
//! register.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │    Customer     │   │  DiscountPreview    │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (numeric)   │   │  id             │   │  subtotal?          │   │
//! │  │  sku / barcode  │   │  phone          │   │  total?             │   │
//! │  │  selling_price  │   │  loyalty_points │   │  4 discount kinds   │   │
//! │  │  tax_rate       │   │  membership     │   │  points_earned?     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  Catalog and customers are read-only snapshots from the backend.       │
//! │  The preview is authoritative when present, local math is fallback.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. The billing screens allow two decimals on a tax
/// percentage, so `8.25%` is stored exactly as `825`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points, clamped to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            TaxRate(Self::MAX_BPS)
        } else {
            TaxRate(bps)
        }
    }

    /// Creates a tax rate from a percentage sent by the backend.
    ///
    /// Negative or non-finite values become zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate::zero();
        }
        TaxRate::from_bps((pct * 100.0).round().min(f64::from(Self::MAX_BPS)) as u32)
    }

    /// Parses a percentage typed as text (`"5"`, `"8.25"`).
    ///
    /// ```rust
    /// use tally_core::types::TaxRate;
    ///
    /// assert_eq!(TaxRate::parse_percent("8.25").bps(), 825);
    /// assert_eq!(TaxRate::parse_percent("250").bps(), 10_000);
    /// assert_eq!(TaxRate::parse_percent("n/a").bps(), 0);
    /// ```
    pub fn parse_percent(text: &str) -> Self {
        // A percentage with two decimals has the same digits as cents
        let hundredths = Money::parse_lenient(text).cents();
        TaxRate::from_bps(hundredths.clamp(0, i64::from(Self::MAX_BPS)) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry available for billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Numeric backend identifier; cashiers may type it directly.
    pub id: i64,

    /// Display name shown to the cashier.
    pub name: String,

    /// Stock Keeping Unit.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, EAN-8...).
    pub barcode: Option<String>,

    /// Price per unit, tax included.
    pub selling_price: Money,

    pub tax_rate: TaxRate,

    /// Stock on hand as reported by the backend (informational).
    pub quantity_available: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// Loyalty membership level of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    None,
    Silver,
    Gold,
    Platinum,
}

impl MembershipTier {
    /// Maps a backend label to a tier; unknown labels mean no membership.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "silver" => MembershipTier::Silver,
            "gold" => MembershipTier::Gold,
            "platinum" => MembershipTier::Platinum,
            _ => MembershipTier::None,
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipTier::None => write!(f, "none"),
            MembershipTier::Silver => write!(f, "silver"),
            MembershipTier::Gold => write!(f, "gold"),
            MembershipTier::Platinum => write!(f, "platinum"),
        }
    }
}

/// A customer snapshot selected for the current bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// Loyalty point balance, never negative.
    pub loyalty_points: i64,
    pub membership_tier: MembershipTier,
}

impl Customer {
    /// Builds a customer snapshot, flooring a negative balance at zero.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        phone: impl Into<String>,
        loyalty_points: i64,
        membership_tier: MembershipTier,
    ) -> Self {
        Customer {
            id,
            name: name.into(),
            phone: phone.into(),
            loyalty_points: loyalty_points.max(0),
            membership_tier,
        }
    }
}

// =============================================================================
// Discount Preview
// =============================================================================

/// Discount categories a preview can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Item,
    Bill,
    Coupon,
    Membership,
}

impl DiscountKind {
    /// Display order on the billing screen.
    pub const ALL: [DiscountKind; 4] = [
        DiscountKind::Item,
        DiscountKind::Bill,
        DiscountKind::Coupon,
        DiscountKind::Membership,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DiscountKind::Item => "Item discount",
            DiscountKind::Bill => "Bill discount",
            DiscountKind::Coupon => "Coupon discount",
            DiscountKind::Membership => "Membership discount",
        }
    }
}

/// Server-computed discount breakdown for the current cart.
///
/// Every field is optional: the backend omits what it did not compute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreview {
    pub subtotal: Option<Money>,
    pub total: Option<Money>,
    pub item_discount: Option<Money>,
    pub bill_discount: Option<Money>,
    pub coupon_discount: Option<Money>,
    pub membership_discount: Option<Money>,
    /// Loyalty points the customer would earn on this bill.
    pub points_earned: Option<i64>,
}

impl DiscountPreview {
    /// Returns the amount reported for a discount category.
    pub fn discount(&self, kind: DiscountKind) -> Option<Money> {
        match kind {
            DiscountKind::Item => self.item_discount,
            DiscountKind::Bill => self.bill_discount,
            DiscountKind::Coupon => self.coupon_discount,
            DiscountKind::Membership => self.membership_discount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
        assert_eq!(TaxRate::from_bps(20_000).bps(), TaxRate::MAX_BPS);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_percentage(5.0).bps(), 500);
        assert_eq!(TaxRate::from_percentage(-3.0).bps(), 0);
        assert_eq!(TaxRate::from_percentage(f64::INFINITY).bps(), 0);
        assert_eq!(TaxRate::from_percentage(180.0).bps(), TaxRate::MAX_BPS);
    }

    #[test]
    fn test_tax_rate_parse_percent() {
        assert_eq!(TaxRate::parse_percent("18").bps(), 1800);
        assert_eq!(TaxRate::parse_percent("-4").bps(), 0);
        assert!(TaxRate::parse_percent("").is_zero());
    }

    #[test]
    fn test_membership_tier_from_label() {
        assert_eq!(MembershipTier::from_label("Gold"), MembershipTier::Gold);
        assert_eq!(MembershipTier::from_label(" silver "), MembershipTier::Silver);
        assert_eq!(MembershipTier::from_label("diamond"), MembershipTier::None);
        assert_eq!(MembershipTier::Platinum.to_string(), "platinum");
    }

    #[test]
    fn test_customer_balance_floor() {
        let customer = Customer::new(1, "Asha", "9876543210", -20, MembershipTier::None);
        assert_eq!(customer.loyalty_points, 0);
    }

    #[test]
    fn test_preview_discount_lookup() {
        let preview = DiscountPreview {
            coupon_discount: Some(Money::from_cents(300)),
            ..Default::default()
        };
        assert_eq!(
            preview.discount(DiscountKind::Coupon),
            Some(Money::from_cents(300))
        );
        assert_eq!(preview.discount(DiscountKind::Item), None);
    }
}
