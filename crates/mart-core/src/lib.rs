//! # mart-core: Pure Billing Logic for Mart POS
//!
//! This crate is the **heart** of Mart POS. It contains the billing and
//! offer rules as plain values and functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mart POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Till UI / mart-report CLI (callers)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mart-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   bill    │  │ discount  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Bill    │  │ LineCalc  │  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │ BillItem  │  │  offers   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │  catalog  │  │validation │                                 │   │
//! │  │   │  traits   │  │   rules   │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO FILES • NO CLOCK • NO LOGGING SUBSCRIBER                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mart-store (durable side)                    │   │
//! │  │       invoice file, sales log, flat-file tables, reports        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Offer, BillItem, Invoice, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`discount`] - Per-line offer pricing
//! - [`catalog`] - Catalog / offer / customer contracts and in-memory stores
//! - [`bill`] - The in-progress sale and stock reservation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mart_core::{Bill, Money, Offer, OfferBook, Product, ProductCatalog, TaxRate};
//!
//! let mut catalog: ProductCatalog =
//!     [Product::new(101, "Soap", Money::from_cents(1000), 100)].into_iter().collect();
//! let offers: OfferBook = [Offer::buy_x_get_y(1, 101, 2, 1)].into_iter().collect();
//!
//! let mut bill = Bill::new();
//! bill.add(&mut catalog, &offers, 101, 9).unwrap();
//!
//! let totals = bill.totals(TaxRate::default());
//! assert_eq!(totals.subtotal.to_string(), "60.00");
//! assert_eq!(totals.tax.to_string(), "10.80");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod catalog;
pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{AddOutcome, Bill, BillTotals, EditOutcome, LowStockAdvisory};
pub use catalog::{Catalog, CustomerBook, CustomerStore, OfferBook, OfferResolver, ProductCatalog};
pub use discount::{compute_line, LineCalc};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST applied to every bill: 18%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Stock level at or below which a product is reported as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity of a single product on one bill.
///
/// Catches slips like typing 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9999;
