//! # Catalog Matching
//!
//! Resolves what the cashier typed or scanned into a product, and builds
//! the live suggestion list under the code field.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  input "5449000000996\r"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  exact_match(trimmed)                                                   │
//! │  name (case-insensitive) │ barcode │ SKU │ numeric id                  │
//! │       │ miss                                                            │
//! │       ▼                                                                 │
//! │  long enough to be a scan? (≥ 8 alphanumerics)                          │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  scan_match(normalised)                                                 │
//! │  barcode (leading zeros ignored) │ SKU │ id                             │
//! │       │ miss                                                            │
//! │       ▼                                                                 │
//! │  unresolved: row keeps the raw code, suggestions refresh               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::types::Product;

/// Maximum number of products offered under the code field.
pub const MAX_SUGGESTIONS: usize = 8;

/// Shortest input treated as a probable scan (EAN-8).
pub const SCAN_MIN_LENGTH: usize = 8;

/// Keeps only ASCII letters and digits, uppercased.
///
/// Scanners append CR/LF/TAB and some print separators (`0123-4567`).
fn normalize_scan(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// UPC-A and EAN-13 differ by a leading zero.
fn same_barcode_digits(a: &str, b: &str) -> bool {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    !a.is_empty() && a == b
}

/// The product list loaded from the backend for the current tenant.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Exact match on name (case-insensitive), barcode, SKU or numeric id.
    ///
    /// First catalog entry wins when several match.
    pub fn exact_match(&self, input: &str) -> Option<&Product> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let lowered = input.to_lowercase();
        let numeric_id = input.parse::<i64>().ok();

        self.products.iter().find(|p| {
            p.name.to_lowercase() == lowered
                || p.barcode.as_deref() == Some(input)
                || p.sku == input
                || numeric_id == Some(p.id)
        })
    }

    /// Looser match for scanner input: barcode, SKU or id on the normalised
    /// code. Short input is never treated as a scan.
    pub fn scan_match(&self, input: &str) -> Option<&Product> {
        let code = normalize_scan(input);
        if code.len() < SCAN_MIN_LENGTH {
            return None;
        }
        let numeric_id = code.parse::<i64>().ok();

        self.products.iter().find(|p| {
            p.barcode
                .as_deref()
                .is_some_and(|barcode| same_barcode_digits(&normalize_scan(barcode), &code))
                || normalize_scan(&p.sku) == code
                || numeric_id == Some(p.id)
        })
    }

    /// Exact match first, then the scan fallback.
    pub fn resolve(&self, input: &str) -> Option<&Product> {
        if let Some(product) = self.exact_match(input) {
            return Some(product);
        }
        let product = self.scan_match(input);
        if let Some(product) = product {
            debug!(input = %input.trim(), product_id = product.id, "Resolved by scan fallback");
        }
        product
    }

    /// Up to [`MAX_SUGGESTIONS`] products whose name, barcode or SKU
    /// contains the input, case-insensitively, in catalog order.
    pub fn suggestions(&self, input: &str) -> Vec<Product> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.sku.to_lowercase().contains(&needle)
                    || p.barcode
                        .as_deref()
                        .is_some_and(|b| b.to_lowercase().contains(&needle))
            })
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Catalog::new(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::TaxRate;

    fn product(id: i64, name: &str, sku: &str, barcode: Option<&str>) -> Product {
        Product {
            id,
            name: name.to_string(),
            sku: sku.to_string(),
            barcode: barcode.map(str::to_string),
            selling_price: Money::from_cents(100 * id),
            tax_rate: TaxRate::from_bps(500),
            quantity_available: 10,
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            product(1, "Basmati Rice 5kg", "RICE-5", Some("8901234567890")),
            product(2, "Brown Bread", "BRD-01", Some("036000291452")),
            product(3, "Milk 1L", "MILK-1L", None),
            product(42, "Sea Salt", "SALT-250", Some("40123455")),
        ])
    }

    #[test]
    fn test_exact_match_by_each_key() {
        let catalog = catalog();
        assert_eq!(catalog.exact_match("brown bread").map(|p| p.id), Some(2));
        assert_eq!(catalog.exact_match("8901234567890").map(|p| p.id), Some(1));
        assert_eq!(catalog.exact_match("MILK-1L").map(|p| p.id), Some(3));
        assert_eq!(catalog.exact_match(" 42 ").map(|p| p.id), Some(42));
    }

    #[test]
    fn test_exact_match_is_exact() {
        let catalog = catalog();
        assert!(catalog.exact_match("milk-1l").is_none()); // SKU is case-sensitive
        assert!(catalog.exact_match("Brown").is_none());
        assert!(catalog.exact_match("").is_none());
    }

    #[test]
    fn test_scan_match_strips_scanner_noise() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("8901234567890\r\n").map(|p| p.id), Some(1));
        assert_eq!(catalog.resolve("4012-3455").map(|p| p.id), Some(42));
    }

    #[test]
    fn test_scan_match_ignores_leading_zeros() {
        let catalog = catalog();
        // EAN-13 form of the UPC-A barcode 036000291452
        assert_eq!(catalog.resolve("0036000291452").map(|p| p.id), Some(2));
    }

    #[test]
    fn test_scan_match_requires_minimum_length() {
        let catalog = catalog();
        assert!(catalog.scan_match("milk1l").is_none());
        assert_eq!(catalog.scan_match("salt250 ").map(|p| p.id), None);
        assert_eq!(catalog.scan_match("salt-250-").map(|p| p.id), None);
        assert_eq!(catalog.scan_match("rice-5 xx").map(|p| p.id), None);
    }

    #[test]
    fn test_suggestions_substring_match() {
        let catalog = catalog();
        let ids: Vec<i64> = catalog.suggestions("BR").iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);

        let ids: Vec<i64> = catalog.suggestions("890").iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);

        assert!(catalog.suggestions("   ").is_empty());
    }

    #[test]
    fn test_suggestions_capped() {
        let products = (1..=20)
            .map(|i| product(i, &format!("Soap {i}"), &format!("SOAP-{i}"), None))
            .collect::<Vec<_>>();
        let catalog = Catalog::from(products);

        let suggestions = catalog.suggestions("soap");
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions[0].id, 1);
    }
}
