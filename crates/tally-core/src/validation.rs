//! # Validation Module
//!
//! Checks applied to input that leaves the counter for the backend.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Bill editing                                                 │
//! │  └── Never rejects: bad numbers degrade to 0, redeem is clamped        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Outbound requests (THIS MODULE)                              │
//! │  ├── customer phone lookup                                             │
//! │  ├── coupon codes                                                      │
//! │  └── catalog search text                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Authoritative business rules                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::invoice::InvoiceDraft;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a phone number used to look up a customer.
///
/// ## Rules
/// - Spaces, `-`, `(`, `)` and a leading `+` are ignored
/// - 7 to 15 digits remain (E.164 allows at most 15)
///
/// ## Returns
/// The digits only, ready for the lookup request.
///
/// ```rust
/// use tally_core::validation::validate_phone;
///
/// assert_eq!(validate_phone("+91 98765-43210").unwrap(), "919876543210");
/// assert!(validate_phone("12ab").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let stripped = phone.strip_prefix('+').unwrap_or(phone);
    let mut digits = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "phone".to_string(),
                    reason: "must contain only digits".to_string(),
                })
            }
        }
    }

    if digits.len() < 7 {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: 7,
        });
    }
    if digits.len() > 15 {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: 15,
        });
    }

    Ok(digits)
}

/// Validates a coupon code.
///
/// ## Rules
/// - 1 to 32 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "coupon code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "coupon code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a catalog search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an invoice draft before submission.
///
/// ## Rules
/// - At least one line
/// - Every line has a positive quantity and a non-negative price
/// - Redeemed points are not negative
pub fn validate_invoice(draft: &InvoiceDraft) -> ValidationResult<()> {
    if draft.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    for line in &draft.lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if line.unit_price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "unit price".to_string(),
            });
        }
    }

    if draft.redeem_points < 0 {
        return Err(ValidationError::MustBePositive {
            field: "redeem points".to_string(),
        });
    }

    if let Some(code) = &draft.coupon_code {
        validate_coupon_code(code)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("9876543210").unwrap(), "9876543210");
        assert_eq!(validate_phone(" (555) 010-1234 ").unwrap(), "5550101234");

        assert!(matches!(
            validate_phone(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_phone("12345"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_phone("1234567890123456"),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            validate_phone("98765x3210"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("SAVE10").is_ok());
        assert!(validate_coupon_code("diwali_2024-a").is_ok());

        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("has space").is_err());
        assert!(validate_coupon_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_invoice() {
        use crate::invoice::InvoiceLine;
        use crate::money::Money;
        use crate::types::TaxRate;

        let mut draft = InvoiceDraft {
            client_reference: uuid::Uuid::new_v4(),
            tenant_id: "t".to_string(),
            customer_id: None,
            coupon_code: None,
            redeem_points: 0,
            lines: vec![],
            subtotal: Money::zero(),
            total: Money::zero(),
            payable: Money::zero(),
            created_at: chrono::Utc::now(),
        };
        assert!(matches!(
            validate_invoice(&draft),
            Err(ValidationError::Required { ref field }) if field == "lines"
        ));

        draft.lines.push(InvoiceLine {
            product_id: 1,
            name: "Tea".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(1000),
            tax_rate: TaxRate::from_bps(500),
            line_total: Money::from_cents(2000),
        });
        assert!(validate_invoice(&draft).is_ok());

        draft.lines[0].quantity = 0;
        assert!(matches!(
            validate_invoice(&draft),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  rice ").unwrap(), "rice");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }
}
