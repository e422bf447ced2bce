//! # Validation Module
//!
//! Input validation for rows entering the till: products, offers, customer
//! details and bill quantities.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Flat-file loader (mart-store)                                │
//! │  ├── Row shape (field count, numeric parse)                            │
//! │  └── Malformed rows skipped with a warning                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rules (non-negative price, percent range)                │
//! │  └── Delimiter safety (no ',' or newline in text fields)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Bill Builder                                                 │
//! │  └── Stock and quantity rules at the moment of sale                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offers that fail [`validate_offer`] are still loaded: the discount
//! engine prices them as "no offer". The loader only logs them.
//!
//! ## Usage
//! ```rust
//! use mart_core::validation::{validate_quantity, validate_text_field};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_text_field("name", "Tea, 250g").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Offer, OfferKind, Product};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name the flat files accept.
pub const MAX_NAME_LEN: usize = 127;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a free-text field for the flat-file delimiters.
///
/// ## Rules
/// - Must not contain `,` (column delimiter)
/// - Must not contain a line break (row delimiter)
pub fn validate_text_field(field: &str, value: &str) -> ValidationResult<()> {
    if value.contains(',') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain ','".to_string(),
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a single line".to_string(),
        });
    }
    Ok(())
}

/// Validates a product or customer name.
///
/// ## Example
/// ```rust
/// use mart_core::validation::validate_name;
///
/// assert!(validate_name("Basmati Rice 1kg").is_ok());
/// assert!(validate_name("  ").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    validate_text_field("name", name)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a bill quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (9999)
///
/// ## User Workflow
/// ```text
/// Cashier enters quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?    → Error: "quantity must be positive"
///      ├── qty > 9999?  → Error: "quantity must be between 1 and 9999"
///      └── OK → Bill::add
/// ```
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

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a catalog row.
///
/// ## Rules
/// - Name passes [`validate_name`]
/// - Price and stock are non-negative (zero price means a free item)
/// - Low-stock threshold is non-negative
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name(&product.name)?;

    if product.price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    if product.stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    if product.low_stock_threshold < 0 {
        return Err(ValidationError::OutOfRange {
            field: "low_threshold".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an offer's parameters.
///
/// ## Rules
/// - Percent offers: `0..=100`
/// - Buy-X-get-Y: `buy_x > 0`, `get_y >= 0`
pub fn validate_offer(offer: &Offer) -> ValidationResult<()> {
    match offer.kind {
        OfferKind::Percent(percent) => {
            if !percent.is_valid() {
                return Err(ValidationError::OutOfRange {
                    field: "percent".to_string(),
                    min: 0,
                    max: 100,
                });
            }
        }
        OfferKind::BuyXGetY { buy_x, get_y } => {
            if buy_x <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "buy_x".to_string(),
                });
            }
            if get_y < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "get_y".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
    }

    validate_text_field("description", &offer.description)
}

// =============================================================================
// Unit Tests
// =============================================================================
