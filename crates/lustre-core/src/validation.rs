//! # Validation Module
//!
//! Input validation utilities for Lustre.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Tauri IPC                                                    │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: Business rule validation                        │
//! │  ├── weights, rates, discounts                                         │
//! │  └── names, phone numbers, URLs                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lustre_core::validation::{validate_sku, validate_weights};
//!
//! validate_sku("RING-22K-014").unwrap();
//! validate_weights(10_000, 250).unwrap();
//! assert!(validate_weights(10_000, 10_001).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_WEIGHT_MG};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use lustre_core::validation::validate_sku;
///
/// assert!(validate_sku("NECK-18K-002").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a required display name (products, stones, collections, customers).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a search query and returns it trimmed. Empty is allowed.
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

/// Validates a purity grade such as "24K", "22k", "18K" or "925".
pub fn validate_purity(purity: &str) -> ValidationResult<()> {
    let purity = purity.trim();
    let digits = purity
        .strip_suffix('K')
        .or_else(|| purity.strip_suffix('k'))
        .unwrap_or(purity);

    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "purity".to_string(),
            reason: "expected karat (e.g. 22K) or fineness (e.g. 925)".to_string(),
        });
    }

    Ok(())
}

/// Validates an Indian mobile or landline number.
///
/// ## Rules
/// - Optional leading `+91` or `0`
/// - Spaces and hyphens are ignored
/// - 10 digits remain
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    normalize_phone(phone).map(|_| ())
}

/// Returns the bare 10 digits of a valid phone number, so "+91 98765-43210"
/// and "09876543210" identify the same customer.
pub fn normalize_phone(phone: &str) -> ValidationResult<String> {
    let digits: String = phone
        .trim()
        .trim_start_matches("+91")
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = digits.strip_prefix('0').unwrap_or(&digits);

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a 10 digit number".to_string(),
        });
    }

    Ok(digits.to_string())
}

/// Validates an email address (shape check only).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates an image or link URL used by storefront items.
pub fn validate_url(field: &str, url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !url.contains(char::is_whitespace) => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an http(s) URL".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a weight, rate or charge is not negative.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

/// Validates a non-negative value against a ceiling.
///
/// Every pricing input has one so a line total always fits in paise.
pub fn validate_at_most(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    validate_non_negative(field, value)?;

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

/// Validates gross and less weight together.
///
/// ## Rules
/// - Both non-negative
/// - Gross weight is at most MAX_WEIGHT_MG
/// - Less weight cannot exceed gross weight (net weight >= 0)
pub fn validate_weights(gross_mg: i64, less_mg: i64) -> ValidationResult<()> {
    validate_at_most("gross weight", gross_mg, MAX_WEIGHT_MG)?;
    validate_non_negative("less weight", less_mg)?;

    if less_mg > gross_mg {
        return Err(ValidationError::OutOfRange {
            field: "less weight".to_string(),
            min: 0,
            max: gross_mg,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a payment amount in paise. Zero or negative payments are rejected.
pub fn validate_payment_amount(paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates cart size before adding a new line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use lustre_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("RING-22K-014").is_ok());
        assert!(validate_sku("bangle_7").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_product_name("Temple Necklace").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_name("collection", &"x".repeat(81), 80).is_err());
    }

    #[test]
    fn test_validate_purity() {
        assert!(validate_purity("22K").is_ok());
        assert!(validate_purity("18k").is_ok());
        assert!(validate_purity("925").is_ok());
        assert!(validate_purity("K").is_err());
        assert!(validate_purity("gold").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("09876543210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("").is_err());
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "9876543210");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.in").is_ok());
        assert!(validate_email("asha@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a sha@example.com").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("image", "https://cdn.example.com/a.jpg").is_ok());
        assert!(validate_url("image", "ftp://x").is_err());
        assert!(validate_url("image", "https://").is_err());
    }

    #[test]
    fn test_validate_weights() {
        assert!(validate_weights(10_000, 0).is_ok());
        assert!(validate_weights(10_000, 10_000).is_ok());
        assert!(validate_weights(10_000, 10_001).is_err());
        assert!(validate_weights(-1, 0).is_err());
        assert!(validate_weights(MAX_WEIGHT_MG + 1, 0).is_err());
    }

    #[test]
    fn test_validate_at_most() {
        assert!(validate_at_most("va charges", 0, 100).is_ok());
        assert!(validate_at_most("va charges", 100, 100).is_ok());
        assert!(matches!(
            validate_at_most("va charges", 101, 100),
            Err(ValidationError::OutOfRange { max: 100, .. })
        ));
        assert!(matches!(
            validate_at_most("va charges", -1, 100),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_discount_and_tax() {
        assert!(validate_discount_bps(10_000).is_ok());
        assert!(validate_discount_bps(10_001).is_err());
        assert!(validate_tax_rate_bps(300).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
