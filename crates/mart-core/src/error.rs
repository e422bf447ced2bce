//! # Error Types
//!
//! Domain-specific error types for mart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mart-core errors (this file)                                          │
//! │  ├── CoreError        - Bill / stock rule violations                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mart-store errors (separate crate)                                    │
//! │  └── StoreError       - Invoice file, flat files, empty bill           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → CLI / caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery Guarantee
//! Every `CoreError` returned by a bill operation leaves the bill AND the
//! catalog exactly as they were before the call.

use thiserror::Error;

use crate::types::{CustomerId, ProductId};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent billing rule violations. All of them are
/// recoverable at the call site.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Product id is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Customer id is not in the customer store.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Quantity is zero or negative.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// The product has no stock at all.
    #[error("Product {product_id} ({name}) is out of stock")]
    OutOfStock { product_id: ProductId, name: String },

    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// add(101, 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 101, available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// Product is already on the bill; quantity changes go through `edit`.
    #[error("Product {0} is already on the bill, edit its quantity instead")]
    DuplicateItem(ProductId),

    /// Product is not on the bill.
    #[error("Product {0} is not on the bill")]
    NotInBill(ProductId),

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used when loading offers/products and before bill operations run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a field containing the column delimiter).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two products with the same id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 101,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 101: available 3, requested 5"
        );

        let err = CoreError::DuplicateItem(7);
        assert_eq!(
            err.to_string(),
            "Product 7 is already on the bill, edit its quantity instead"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "percent".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "percent must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "buy_x".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
