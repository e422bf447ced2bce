//! # Bill Builder
//!
//! The in-progress sale at the till, and the only code that moves stock.
//!
//! ## Bill Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill Operations                                      │
//! │                                                                         │
//! │  Cashier Action        Bill Method            Stock Effect              │
//! │  ──────────────        ───────────            ────────────              │
//! │                                                                         │
//! │  Scan product ────────► add(id, q) ─────────► stock −= q               │
//! │                                                                         │
//! │  Change quantity ─────► edit(id, q') ───────► stock −= (q' − q)        │
//! │                                                                         │
//! │  Set quantity 0 ──────► edit(id, 0) ────────► stock += q               │
//! │                                                                         │
//! │  Void line ───────────► remove(id) ─────────► stock += q               │
//! │                                                                         │
//! │  Abandon sale ────────► cancel() ───────────► stock += Σ q             │
//! │                                                                         │
//! │  Pay ─────────────────► into_invoice() ─────► (already reserved)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - One item per product id; re-adding is `DuplicateItem`, quantity changes
//!   go through `edit` so buy-X-get-Y groups are re-priced as a whole
//! - `original stock − current stock == Σ item quantities` at all times
//! - A failed operation changes neither the bill nor the catalog

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, OfferResolver};
use crate::discount::{compute_line, price_line};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BillItem, CustomerId, Invoice, InvoiceId, ProductId, TaxRate, GUEST_CUSTOMER_ID};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Outcomes
// =============================================================================

/// Raised when a sale leaves a product at or below its threshold.
///
/// Advisory only: the add that triggered it has already succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAdvisory {
    pub product_id: ProductId,
    pub name: String,
    pub remaining: i64,
    pub threshold: i64,
}

/// Result of a successful [`Bill::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub item: BillItem,
    pub low_stock: Option<LowStockAdvisory>,
}

/// Result of a successful [`Bill::edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(BillItem),
    /// Quantity 0 removed the line.
    Removed(BillItem),
}

/// Live totals for the bill preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Bill
// =============================================================================

/// The sale being rung up.
///
/// Created empty, mutated by add/edit/remove, then consumed exactly once by
/// [`Bill::into_invoice`] or emptied by [`Bill::cancel`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    items: Vec<BillItem>,
    customer_id: CustomerId,
}

impl Bill {
    /// Creates an empty bill for the guest customer.
    pub fn new() -> Self {
        Bill {
            items: Vec::new(),
            customer_id: GUEST_CUSTOMER_ID,
        }
    }

    /// Creates an empty bill for a known customer.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Bill {
            items: Vec::new(),
            customer_id,
        }
    }

    pub fn select_customer(&mut self, customer_id: CustomerId) {
        self.customer_id = customer_id;
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Adds a product that is not yet on the bill and reserves its stock.
    ///
    /// ## Checks (in order)
    /// 1. product exists ─────────► `ProductNotFound`
    /// 2. stock > 0 ──────────────► `OutOfStock`
    /// 3. quantity > 0 ───────────► `InvalidQuantity`
    /// 4. quantity ≤ maximum ─────► `QuantityTooLarge`
    /// 5. quantity ≤ stock ───────► `InsufficientStock`
    /// 6. not already on bill ────► `DuplicateItem`
    pub fn add<C, O>(
        &mut self,
        catalog: &mut C,
        offers: &O,
        product_id: ProductId,
        quantity: i64,
    ) -> CoreResult<AddOutcome>
    where
        C: Catalog + ?Sized,
        O: OfferResolver + ?Sized,
    {
        let product = catalog
            .lookup(product_id)
            .ok_or(CoreError::ProductNotFound(product_id))?;

        if product.is_out_of_stock() {
            return Err(CoreError::OutOfStock {
                product_id,
                name: product.name.clone(),
            });
        }
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id,
                quantity,
            });
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                product_id,
                available: product.stock,
                requested: quantity,
            });
        }
        if self.item(product_id).is_some() {
            return Err(CoreError::DuplicateItem(product_id));
        }

        let line = compute_line(product, quantity, offers.resolve(product_id));
        let item = BillItem {
            product_id,
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
            discount: line.discount,
            line_total: line.line_total,
        };
        let threshold = product.low_stock_threshold;

        // Last fallible step; nothing has been touched if it fails.
        let remaining = catalog.adjust_stock(product_id, -quantity)?;

        let low_stock = (remaining <= threshold).then(|| LowStockAdvisory {
            product_id,
            name: item.name.clone(),
            remaining,
            threshold,
        });

        self.items.push(item.clone());
        Ok(AddOutcome { item, low_stock })
    }

    /// Sets a line's quantity, moving only the difference in stock.
    ///
    /// The line is re-priced from scratch at the new quantity with the
    /// currently resolved offer, against the unit price snapshot.
    /// Quantity `0` removes the line and returns all its stock.
    pub fn edit<C, O>(
        &mut self,
        catalog: &mut C,
        offers: &O,
        product_id: ProductId,
        new_quantity: i64,
    ) -> CoreResult<EditOutcome>
    where
        C: Catalog + ?Sized,
        O: OfferResolver + ?Sized,
    {
        let index = self
            .position(product_id)
            .ok_or(CoreError::NotInBill(product_id))?;

        if new_quantity < 0 {
            return Err(CoreError::InvalidQuantity {
                product_id,
                quantity: new_quantity,
            });
        }
        if new_quantity == 0 {
            let removed = self.items.remove(index);
            restore_stock(catalog, product_id, removed.quantity);
            return Ok(EditOutcome::Removed(removed));
        }
        if new_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let old_quantity = self.items[index].quantity;
        let delta = new_quantity - old_quantity;

        if delta > 0 {
            let available = catalog
                .lookup(product_id)
                .ok_or(CoreError::ProductNotFound(product_id))?
                .stock;
            if delta > available {
                return Err(CoreError::InsufficientStock {
                    product_id,
                    available,
                    requested: delta,
                });
            }
        }

        let unit_price = self.items[index].unit_price;
        let line = price_line(unit_price, new_quantity, offers.resolve(product_id));

        if delta != 0 {
            catalog.adjust_stock(product_id, -delta)?;
        }

        let item = &mut self.items[index];
        item.quantity = new_quantity;
        item.discount = line.discount;
        item.line_total = line.line_total;
        Ok(EditOutcome::Updated(item.clone()))
    }

    /// Drops a line and returns its stock. Absent ids are a no-op.
    pub fn remove<C>(&mut self, catalog: &mut C, product_id: ProductId) -> Option<BillItem>
    where
        C: Catalog + ?Sized,
    {
        let index = self.position(product_id)?;
        let removed = self.items.remove(index);
        restore_stock(catalog, product_id, removed.quantity);
        Some(removed)
    }

    /// Abandons the sale: every reserved unit goes back on the shelf.
    ///
    /// Returns the released lines; an empty bill releases nothing.
    pub fn cancel<C>(&mut self, catalog: &mut C) -> Vec<BillItem>
    where
        C: Catalog + ?Sized,
    {
        let released = std::mem::take(&mut self.items);
        for item in &released {
            restore_stock(catalog, item.product_id, item.quantity);
        }
        released
    }

    /// Converts the bill into an invoice. Stock stays reserved.
    pub fn into_invoice(self, id: InvoiceId, timestamp: NaiveDateTime, tax_rate: TaxRate) -> Invoice {
        let totals = self.totals(tax_rate);
        Invoice {
            id,
            timestamp,
            customer_id: self.customer_id,
            items: self.items,
            pre_tax_total: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
        }
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    pub fn items(&self) -> &[BillItem] {
        &self.items
    }

    pub fn item(&self, product_id: ProductId) -> Option<&BillItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Number of distinct products on the bill.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line totals (after discounts, before tax).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.line_total).sum()
    }

    pub fn total_discount(&self) -> Money {
        self.items.iter().map(|i| i.discount).sum()
    }

    /// Units reserved by this bill.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn totals(&self, tax_rate: TaxRate) -> BillTotals {
        let subtotal = self.subtotal();
        let tax = subtotal.calculate_tax(tax_rate);
        BillTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }
}

/// Puts reserved units back.
fn restore_stock<C>(catalog: &mut C, product_id: ProductId, quantity: i64)
where
    C: Catalog + ?Sized,
{
    // A positive delta only fails for a product deleted mid-sale, which has
    // no shelf to return to.
    let _ = catalog.adjust_stock(product_id, quantity);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OfferBook, ProductCatalog};
    use crate::types::{Offer, Percent, Product};
    use chrono::NaiveDate;

    fn setup() -> (ProductCatalog, OfferBook) {
        let catalog: ProductCatalog = [
            Product::new(101, "Soap", Money::from_cents(1000), 100),
            Product::new(102, "Tea 250g", Money::from_cents(15000), 8).with_threshold(5),
            Product::new(103, "Matches", Money::from_cents(200), 0),
        ]
        .into_iter()
        .collect();

        let offers: OfferBook = [
            Offer::buy_x_get_y(1, 101, 2, 1),
            Offer::percent(2, 102, Percent::from_whole(10)),
        ]
        .into_iter()
        .collect();

        (catalog, offers)
    }

    fn stock(catalog: &ProductCatalog, id: ProductId) -> i64 {
        catalog.lookup(id).unwrap().stock
    }

    #[test]
    fn test_add_reserves_stock_and_prices_offer() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();

        let outcome = bill.add(&mut catalog, &offers, 101, 9).unwrap();

        assert_eq!(outcome.item.line_total, Money::from_cents(6000));
        assert_eq!(outcome.item.discount, Money::from_cents(3000));
        assert!(outcome.low_stock.is_none());
        assert_eq!(stock(&catalog, 101), 91);
        assert_eq!(bill.subtotal(), Money::from_cents(6000));
    }

    #[test]
    fn test_add_failures_leave_everything_untouched() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();

        assert_eq!(
            bill.add(&mut catalog, &offers, 999, 1).unwrap_err(),
            CoreError::ProductNotFound(999)
        );
        assert!(matches!(
            bill.add(&mut catalog, &offers, 103, 1).unwrap_err(),
            CoreError::OutOfStock { product_id: 103, .. }
        ));
        assert!(matches!(
            bill.add(&mut catalog, &offers, 101, 0).unwrap_err(),
            CoreError::InvalidQuantity { .. }
        ));
        assert_eq!(
            bill.add(&mut catalog, &offers, 102, 9).unwrap_err(),
            CoreError::InsufficientStock {
                product_id: 102,
                available: 8,
                requested: 9
            }
        );

        assert!(bill.is_empty());
        assert_eq!(stock(&catalog, 101), 100);
        assert_eq!(stock(&catalog, 102), 8);
    }

    #[test]
    fn test_add_duplicate_rejected_without_stock_change() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();

        bill.add(&mut catalog, &offers, 101, 2).unwrap();
        let err = bill.add(&mut catalog, &offers, 101, 3).unwrap_err();

        assert_eq!(err, CoreError::DuplicateItem(101));
        assert_eq!(stock(&catalog, 101), 98);
        assert_eq!(bill.item(101).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_signals_low_stock() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();

        let outcome = bill.add(&mut catalog, &offers, 102, 3).unwrap();
        let advisory = outcome.low_stock.unwrap();

        assert_eq!(advisory.remaining, 5);
        assert_eq!(advisory.threshold, 5);
        assert_eq!(advisory.name, "Tea 250g");
    }

    #[test]
    fn test_edit_moves_only_the_delta() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 101, 4).unwrap();

        bill.edit(&mut catalog, &offers, 101, 9).unwrap();
        assert_eq!(stock(&catalog, 101), 91);

        let outcome = bill.edit(&mut catalog, &offers, 101, 3).unwrap();
        assert_eq!(stock(&catalog, 101), 97);

        // 3 units, buy 2 get 1 -> charged 2
        let EditOutcome::Updated(item) = outcome else {
            panic!("expected an updated line");
        };
        assert_eq!(item.line_total, Money::from_cents(2000));
        assert_eq!(item.discount, Money::from_cents(1000));
    }

    #[test]
    fn test_edit_recomputes_rather_than_accumulates() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();

        // 2 + 2 units priced separately would give no free unit at all
        bill.add(&mut catalog, &offers, 101, 2).unwrap();
        bill.edit(&mut catalog, &offers, 101, 4).unwrap();

        let item = bill.item(101).unwrap();
        assert_eq!(item.line_total, Money::from_cents(3000));
        assert_eq!(item.discount, Money::from_cents(1000));
    }

    #[test]
    fn test_edit_uses_price_snapshot() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 102, 1).unwrap();

        catalog.get_mut(102).unwrap().price = Money::from_cents(99_999);
        bill.edit(&mut catalog, &offers, 102, 2).unwrap();

        let item = bill.item(102).unwrap();
        assert_eq!(item.unit_price, Money::from_cents(15000));
        assert_eq!(item.line_total, Money::from_cents(27000));
    }

    #[test]
    fn test_edit_insufficient_stock() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 102, 5).unwrap();

        let err = bill.edit(&mut catalog, &offers, 102, 9).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: 102,
                available: 3,
                requested: 4
            }
        );
        assert_eq!(bill.item(102).unwrap().quantity, 5);
        assert_eq!(stock(&catalog, 102), 3);
    }

    #[test]
    fn test_edit_to_zero_removes_and_restores() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 101, 6).unwrap();

        let outcome = bill.edit(&mut catalog, &offers, 101, 0).unwrap();
        assert!(matches!(outcome, EditOutcome::Removed(_)));
        assert_eq!(stock(&catalog, 101), 100);

        assert_eq!(
            bill.edit(&mut catalog, &offers, 101, 1).unwrap_err(),
            CoreError::NotInBill(101)
        );
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut catalog, _offers) = setup();
        let mut bill = Bill::new();
        assert!(bill.remove(&mut catalog, 101).is_none());
        assert_eq!(stock(&catalog, 101), 100);
    }

    #[test]
    fn test_cancel_restores_everything() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 101, 10).unwrap();
        bill.add(&mut catalog, &offers, 102, 2).unwrap();

        let released = bill.cancel(&mut catalog);

        assert_eq!(released.len(), 2);
        assert!(bill.is_empty());
        assert_eq!(stock(&catalog, 101), 100);
        assert_eq!(stock(&catalog, 102), 8);

        // idempotent
        assert!(bill.cancel(&mut catalog).is_empty());
        assert_eq!(stock(&catalog, 101), 100);
    }

    #[test]
    fn test_remove_after_product_deleted() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::new();
        bill.add(&mut catalog, &offers, 101, 1).unwrap();
        catalog.remove(101);

        assert!(bill.remove(&mut catalog, 101).is_some());
        assert!(bill.is_empty());
    }

    #[test]
    fn test_into_invoice_totals() {
        let (mut catalog, offers) = setup();
        let mut bill = Bill::for_customer(4);
        bill.add(&mut catalog, &offers, 101, 9).unwrap();

        let timestamp = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let invoice = bill.into_invoice(12, timestamp, TaxRate::from_bps(1800));

        assert_eq!(invoice.id, 12);
        assert_eq!(invoice.customer_id, 4);
        assert_eq!(invoice.pre_tax_total, Money::from_cents(6000));
        assert_eq!(invoice.tax, Money::from_cents(1080));
        assert_eq!(invoice.total, Money::from_cents(7080));
        assert_eq!(invoice.items.len(), 1);
    }
}
