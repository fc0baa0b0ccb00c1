//! # Wire DTOs
//!
//! JSON shapes exchanged with the billing backend.
//!
//! The backend sends money as decimal numbers (sometimes as strings) and is
//! loose about numeric fields. Everything is coerced leniently on the way in:
//! a malformed number becomes zero rather than failing the whole response.
//!
//! ```text
//! backend JSON                      tally-core
//! ────────────────────────────      ──────────────────────────────
//! { "sellingPrice": "45.50" }  ──►  Product.selling_price = 4550¢
//! { "taxRate": 12 }            ──►  Product.tax_rate      = 1200 bps
//! { "loyaltyPoints": -3 }      ──►  Customer.loyalty_points = 0
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_core::money::{self, Money};
use tally_core::{
    BillEditor, Customer, DiscountPreview, InvoiceDraft, MembershipTier, Product, TaxRate,
};

// =============================================================================
// Lenient Scalars
// =============================================================================

/// Reads an integer out of a number or numeric string; anything else is 0.
/// Fractions truncate.
fn lenient_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => Money::parse_lenient(s).major(),
        _ => 0,
    }
}

/// Reads a tax percentage (`5`, `"12.5"`) into basis points.
fn lenient_tax_rate(value: &Value) -> TaxRate {
    match value {
        Value::Number(n) => n.as_f64().map(TaxRate::from_percentage).unwrap_or_default(),
        Value::String(s) => TaxRate::parse_percent(s),
        _ => TaxRate::zero(),
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, with = "money::decimal")]
    pub selling_price: Money,
    #[serde(default)]
    pub tax_rate: Value,
    #[serde(default)]
    pub quantity_available: Value,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product {
            id: dto.id,
            name: dto.name,
            sku: dto.sku.unwrap_or_default(),
            barcode: dto.barcode.filter(|b| !b.trim().is_empty()),
            selling_price: dto.selling_price,
            tax_rate: lenient_tax_rate(&dto.tax_rate),
            quantity_available: lenient_i64(&dto.quantity_available),
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub loyalty_points: Value,
    #[serde(default)]
    pub membership_tier: Option<String>,
}

impl From<CustomerDto> for Customer {
    fn from(dto: CustomerDto) -> Self {
        Customer::new(
            dto.id,
            dto.name,
            dto.phone,
            lenient_i64(&dto.loyalty_points),
            dto.membership_tier
                .as_deref()
                .map(MembershipTier::from_label)
                .unwrap_or_default(),
        )
    }
}

// =============================================================================
// Discount Preview
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(with = "money::decimal")]
    pub unit_price: Money,
}

/// Body of `POST /discounts/preview`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub customer_id: Option<i64>,
    pub coupon_code: Option<String>,
    pub items: Vec<PreviewItem>,
}

impl PreviewRequest {
    /// Snapshots the resolved, non-empty rows of a bill.
    pub fn from_editor(editor: &BillEditor) -> Self {
        PreviewRequest {
            customer_id: editor.customer().map(|c| c.id),
            coupon_code: editor.coupon_code().map(str::to_string),
            items: editor
                .rows()
                .iter()
                .filter(|row| row.effective_quantity() > 0)
                .filter_map(|row| {
                    row.product_id.map(|product_id| PreviewItem {
                        product_id,
                        quantity: row.effective_quantity(),
                        unit_price: row.unit_price,
                    })
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreviewDto {
    #[serde(default, with = "money::decimal::option")]
    pub subtotal: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub total: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub item_discount: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub bill_discount: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub coupon_discount: Option<Money>,
    #[serde(default, with = "money::decimal::option")]
    pub membership_discount: Option<Money>,
    #[serde(default)]
    pub points_earned: Option<Value>,
}

impl From<DiscountPreviewDto> for DiscountPreview {
    fn from(dto: DiscountPreviewDto) -> Self {
        DiscountPreview {
            subtotal: dto.subtotal,
            total: dto.total,
            item_discount: dto.item_discount,
            bill_discount: dto.bill_discount,
            coupon_discount: dto.coupon_discount,
            membership_discount: dto.membership_discount,
            points_earned: dto
                .points_earned
                .filter(|v| !v.is_null())
                .map(|v| lenient_i64(&v)),
        }
    }
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineDto {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(with = "money::decimal")]
    pub unit_price: Money,
    /// Percent, e.g. `12.5`.
    pub tax_rate: f64,
}

/// Body of `POST /invoices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub client_reference: String,
    pub customer_id: Option<i64>,
    pub coupon_code: Option<String>,
    pub redeem_points: i64,
    pub items: Vec<InvoiceLineDto>,
    #[serde(with = "money::decimal")]
    pub subtotal: Money,
    #[serde(with = "money::decimal")]
    pub total: Money,
    #[serde(with = "money::decimal")]
    pub payable: Money,
    pub created_at: String,
}

impl From<&InvoiceDraft> for InvoiceRequest {
    fn from(draft: &InvoiceDraft) -> Self {
        InvoiceRequest {
            client_reference: draft.client_reference.to_string(),
            customer_id: draft.customer_id,
            coupon_code: draft.coupon_code.clone(),
            redeem_points: draft.redeem_points,
            items: draft
                .lines
                .iter()
                .map(|line| InvoiceLineDto {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    tax_rate: line.tax_rate.percentage(),
                })
                .collect(),
            subtotal: draft.subtotal,
            total: draft.total,
            payable: draft.payable,
            created_at: draft.created_at.to_rfc3339(),
        }
    }
}

/// What the backend returns for a created invoice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReceipt {
    pub id: i64,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default, with = "money::decimal")]
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
