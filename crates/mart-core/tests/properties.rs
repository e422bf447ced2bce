//! Property-based tests for the billing rules.
//!
//! # Properties Tested
//!
//! 1. **Stock Property**: after any sequence of bill operations,
//!    `original stock - current stock == Σ bill quantities`
//! 2. **Cancel Property**: cancelling restores the original stock exactly
//! 3. **Percent Property**: `discount == round(gross * p)` and
//!    `line_total == gross - discount`
//! 4. **Buy-X-Get-Y Property**: never charges more than the full quantity

use mart_core::{
    compute_line, Bill, Catalog, Money, Offer, OfferBook, Percent, Product, ProductCatalog,
    ProductId,
};
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

const PRODUCT_IDS: [ProductId; 3] = [1, 2, 3];

#[derive(Debug, Clone)]
enum Op {
    Add(ProductId, i64),
    Edit(ProductId, i64),
    Remove(ProductId),
    Cancel,
}

fn arb_op() -> impl Strategy<Value = Op> {
    let id = prop::sample::select(PRODUCT_IDS.to_vec());
    prop_oneof![
        4 => (id.clone(), -2i64..40).prop_map(|(id, q)| Op::Add(id, q)),
        4 => (id.clone(), -2i64..40).prop_map(|(id, q)| Op::Edit(id, q)),
        2 => id.prop_map(Op::Remove),
        1 => Just(Op::Cancel),
    ]
}

fn arb_stock() -> impl Strategy<Value = [i64; 3]> {
    prop::array::uniform3(0i64..30)
}

fn fixture(stock: [i64; 3]) -> (ProductCatalog, OfferBook) {
    let catalog = [
        Product::new(1, "Soap", Money::from_cents(1000), stock[0]),
        Product::new(2, "Tea", Money::from_cents(15050), stock[1]),
        Product::new(3, "Salt", Money::from_cents(1999), stock[2]),
    ]
    .into_iter()
    .collect();

    let offers = [
        Offer::buy_x_get_y(1, 1, 2, 1),
        Offer::percent(2, 2, Percent::from_bps(1250)),
    ]
    .into_iter()
    .collect();

    (catalog, offers)
}

fn reserved(bill: &Bill, id: ProductId) -> i64 {
    bill.item(id).map_or(0, |item| item.quantity)
}

// ============================================================================
// Property 1 & 2: Stock Reservation
// ============================================================================

proptest! {
    /// Property: stock removed from the shelf is exactly what the bill holds
    #[test]
    fn prop_stock_matches_bill(stock in arb_stock(), ops in prop::collection::vec(arb_op(), 0..40)) {
        let (mut catalog, offers) = fixture(stock);
        let mut bill = Bill::new();

        for op in ops {
            match op {
                Op::Add(id, q) => { let _ = bill.add(&mut catalog, &offers, id, q); }
                Op::Edit(id, q) => { let _ = bill.edit(&mut catalog, &offers, id, q); }
                Op::Remove(id) => { bill.remove(&mut catalog, id); }
                Op::Cancel => { bill.cancel(&mut catalog); }
            }

            for (index, id) in PRODUCT_IDS.iter().enumerate() {
                let current = catalog.lookup(*id).map(|p| p.stock).unwrap_or_default();
                prop_assert!(current >= 0, "stock went negative for {}", id);
                prop_assert_eq!(stock[index] - current, reserved(&bill, *id));
            }
        }
    }

    /// Property: cancel always restores the starting stock
    #[test]
    fn prop_cancel_restores_stock(stock in arb_stock(), ops in prop::collection::vec(arb_op(), 0..20)) {
        let (mut catalog, offers) = fixture(stock);
        let mut bill = Bill::new();

        for op in ops {
            match op {
                Op::Add(id, q) => { let _ = bill.add(&mut catalog, &offers, id, q); }
                Op::Edit(id, q) => { let _ = bill.edit(&mut catalog, &offers, id, q); }
                Op::Remove(id) => { bill.remove(&mut catalog, id); }
                Op::Cancel => {}
            }
        }
        bill.cancel(&mut catalog);

        prop_assert!(bill.is_empty());
        for (index, id) in PRODUCT_IDS.iter().enumerate() {
            prop_assert_eq!(catalog.lookup(*id).map(|p| p.stock), Some(stock[index]));
        }
    }
}

// ============================================================================
// Property 3 & 4: Line Pricing
// ============================================================================

proptest! {
    /// Property: percent offers discount exactly the rounded share of gross
    #[test]
    fn prop_percent_identity(price in 0i64..1_000_000, q in 1i64..10_000, bps in 0u32..=10_000) {
        let product = Product::new(1, "Any", Money::from_cents(price), q);
        let offer = Offer::percent(1, 1, Percent::from_bps(bps));

        let line = compute_line(&product, q, Some(&offer));
        let gross = price * q;
        let expected = (i128::from(gross) * i128::from(bps) + 5_000) / 10_000;

        prop_assert_eq!(i128::from(line.discount.cents()), expected);
        prop_assert_eq!(line.line_total + line.discount, Money::from_cents(gross));
        prop_assert_eq!(line.charged_quantity, q);
    }

    /// Property: buy-X-get-Y charges between zero and the full quantity
    #[test]
    fn prop_buy_x_get_y_bounds(q in 1i64..500, buy_x in 1i64..10, get_y in 0i64..10) {
        let product = Product::new(1, "Any", Money::from_cents(100), q);
        let offer = Offer::buy_x_get_y(1, 1, buy_x, get_y);

        let line = compute_line(&product, q, Some(&offer));

        prop_assert!(line.charged_quantity >= 0);
        prop_assert!(line.charged_quantity <= q);
        prop_assert!(!line.discount.is_negative());
        prop_assert_eq!(line.line_total, Money::from_cents(100 * line.charged_quantity));
    }
}
