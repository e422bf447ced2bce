//! # Discount Engine
//!
//! Prices one bill line under at most one offer.
//!
//! ## Offer Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Line Pricing                                     │
//! │                                                                         │
//! │  NO OFFER        line = q × price            discount = 0              │
//! │                                                                         │
//! │  PERCENT p       discount = q × price × p/100                          │
//! │                  line     = q × price − discount                       │
//! │                  charged  = q                                          │
//! │                                                                         │
//! │  BUY X GET Y     group = x + y                                         │
//! │                  free  = ⌊q / group⌋ × y                               │
//! │                        + max(0, (q mod group) − x)                     │
//! │                  charged  = max(0, q − free)                           │
//! │                  line     = charged × price                            │
//! │                  discount = q × price − line                           │
//! │                                                                         │
//! │  Example: price 10, buy 2 get 1, q = 9                                 │
//! │           group 3, free 3, charged 6, line 60, discount 30             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Never Fails
//! A malformed offer (percent over 100, `buy_x <= 0`, negative `get_y`)
//! prices the line as if there were no offer.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Offer, OfferKind, Product};

/// Result of pricing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCalc {
    /// Units actually paid for.
    pub charged_quantity: i64,
    /// Amount charged for the line, before tax.
    pub line_total: Money,
    /// `quantity × unit price − line_total`.
    pub discount: Money,
}

impl LineCalc {
    fn undiscounted(unit_price: Money, quantity: i64) -> Self {
        LineCalc {
            charged_quantity: quantity,
            line_total: unit_price * quantity,
            discount: Money::zero(),
        }
    }
}

/// Prices `quantity` units of `product` under `offer`.
///
/// ## Example
/// ```rust
/// use mart_core::discount::compute_line;
/// use mart_core::money::Money;
/// use mart_core::types::{Offer, Product};
///
/// let product = Product::new(101, "Soap", Money::from_cents(1000), 100);
/// let offer = Offer::buy_x_get_y(1, 101, 2, 1);
///
/// let line = compute_line(&product, 9, Some(&offer));
/// assert_eq!(line.charged_quantity, 6);
/// assert_eq!(line.line_total, Money::from_cents(6000));
/// assert_eq!(line.discount, Money::from_cents(3000));
/// ```
pub fn compute_line(product: &Product, quantity: i64, offer: Option<&Offer>) -> LineCalc {
    price_line(product.price, quantity, offer)
}

/// Same as [`compute_line`] but against an explicit unit price.
///
/// Bill edits re-price against the price snapshot taken when the line was
/// first added, not the catalog's current price.
pub fn price_line(unit_price: Money, quantity: i64, offer: Option<&Offer>) -> LineCalc {
    if quantity <= 0 {
        return LineCalc::undiscounted(unit_price, 0);
    }

    let Some(offer) = offer else {
        return LineCalc::undiscounted(unit_price, quantity);
    };

    match offer.kind {
        OfferKind::Percent(percent) => {
            if !percent.is_valid() {
                return LineCalc::undiscounted(unit_price, quantity);
            }
            let gross = unit_price * quantity;
            let discount = gross.percentage(percent);
            LineCalc {
                charged_quantity: quantity,
                line_total: gross - discount,
                discount,
            }
        }
        OfferKind::BuyXGetY { buy_x, get_y } => {
            if buy_x <= 0 || get_y < 0 {
                return LineCalc::undiscounted(unit_price, quantity);
            }
            let charged_quantity = (quantity - free_units(quantity, buy_x, get_y)).max(0);
            let line_total = unit_price * charged_quantity;
            LineCalc {
                charged_quantity,
                line_total,
                discount: unit_price * quantity - line_total,
            }
        }
    }
}

/// Free units for buy-X-get-Y, counting a partial trailing group once the
/// paid portion of it is covered.
fn free_units(quantity: i64, buy_x: i64, get_y: i64) -> i64 {
    let group = buy_x + get_y;
    let full_groups = quantity / group;
    let remainder = quantity % group;

    let mut free = full_groups * get_y;
    if remainder > buy_x {
        free += remainder - buy_x;
    }
    free
}

// =============================================================================
// Unit Tests
// =============================================================================
