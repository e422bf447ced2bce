//! # Domain Types
//!
//! Core domain types used throughout Mart POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Offer       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id (0 = guest) │       │
//! │  │  name           │   │  product_id     │   │  name           │       │
//! │  │  price          │   │  kind           │   │  loyalty_points │       │
//! │  │  stock          │   │  description    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    BillItem     │   │    Invoice      │   │  TaxRate /      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  Percent        │       │
//! │  │  snapshots of   │──►│  id, timestamp  │   │  ─────────────  │       │
//! │  │  name + price   │   │  items, totals  │   │  bps (u32)      │       │
//! │  └─────────────────┘   └─────────────────┘   │  1800 = 18%     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::{parse_hundredths, Money, ParseMoneyError};
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

/// Product identifier as written in products.csv and invoice item rows.
pub type ProductId = u32;

/// Customer identifier. `0` is the walk-in guest.
pub type CustomerId = u32;

/// Offer identifier.
pub type OfferId = u32;

/// Ledger-assigned invoice number.
pub type InvoiceId = u32;

/// The walk-in customer; never earns loyalty points.
pub const GUEST_CUSTOMER_ID: CustomerId = 0;

/// Wall-clock layout of invoice and sales-log timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (GST slab applied to every bill)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// Offer percentage in basis points, so `12.5%` stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from whole percent.
    #[inline]
    pub const fn from_whole(percent: u32) -> Self {
        Percent(percent * 100)
    }

    /// Returns the percentage in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// True for `0..=100%`.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::FULL.0
    }
}

/// Same 2-decimal layout offers.csv uses: `12.50`.
impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Percent {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s)
            .and_then(|hundredths| u32::try_from(hundredths).ok())
            .map(Percent)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is never negative outside an in-progress reservation; the
/// [`Catalog`](crate::catalog::Catalog) refuses any adjustment that would
/// take it below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,

    /// Display name shown to cashier and on reprints.
    pub name: String,

    /// Current unit price.
    pub price: Money,

    /// Units on the shelf.
    pub stock: i64,

    /// Stock at or below this level triggers a low-stock advisory.
    pub low_stock_threshold: i64,
}

impl Product {
    /// Creates a product with the default low-stock threshold.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money, stock: i64) -> Self {
        Product {
            id,
            name: name.into(),
            price,
            stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Overrides the low-stock threshold.
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub loyalty_points: i64,
}

impl Customer {
    /// Creates a customer with no contact details and no points.
    pub fn new(id: CustomerId, name: impl Into<String>) -> Self {
        Customer {
            id,
            name: name.into(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            loyalty_points: 0,
        }
    }
}

// =============================================================================
// Offer
// =============================================================================

/// What an offer does to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    /// Price cut on every unit; quantity charged is unchanged.
    Percent(Percent),

    /// Every `buy_x + get_y` units, `get_y` are free.
    BuyXGetY { buy_x: i64, get_y: i64 },
}

impl OfferKind {
    /// Numeric type code stored in offers.csv.
    pub const fn code(&self) -> u8 {
        match self {
            OfferKind::Percent(_) => 1,
            OfferKind::BuyXGetY { .. } => 2,
        }
    }
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferKind::Percent(percent) => write!(f, "{}% off", percent),
            OfferKind::BuyXGetY { buy_x, get_y } => write!(f, "buy {} get {}", buy_x, get_y),
        }
    }
}

/// A promotion attached to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub product_id: ProductId,
    pub kind: OfferKind,
    pub description: String,
}

impl Offer {
    pub fn percent(id: OfferId, product_id: ProductId, percent: Percent) -> Self {
        Offer {
            id,
            product_id,
            kind: OfferKind::Percent(percent),
            description: String::new(),
        }
    }

    pub fn buy_x_get_y(id: OfferId, product_id: ProductId, buy_x: i64, get_y: i64) -> Self {
        Offer {
            id,
            product_id,
            kind: OfferKind::BuyXGetY { buy_x, get_y },
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// =============================================================================
// Bill Item
// =============================================================================

/// A line on a bill or invoice.
///
/// Name and unit price are snapshots taken when the product was added, so
/// the bill keeps charging what the cashier saw even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub line_total: Money,
}

impl BillItem {
    /// `quantity * unit_price`, before any offer.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized sale. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub timestamp: NaiveDateTime,
    pub customer_id: CustomerId,
    pub items: Vec<BillItem>,
    pub pre_tax_total: Money,
    pub tax: Money,
    pub total: Money,
}

impl Invoice {
    /// Sum of all line discounts.
    pub fn total_discount(&self) -> Money {
        self.items.iter().map(|item| item.discount).sum()
    }

    /// Loyalty points earned: one per full 100 of pre-tax spend.
    pub fn loyalty_points(&self) -> i64 {
        self.pre_tax_total.whole_units().div_euclid(100).max(0)
    }

    /// Timestamp in the durable `YYYY-MM-DD HH:MM:SS` layout.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
