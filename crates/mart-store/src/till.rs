//! # Till Session
//!
//! One till: the three tables, the ledger and the bill being rung up,
//! owned together so callers never juggle them separately.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Till::open(config)                                                     │
//! │     ├── load products.csv / offers.csv / customers.csv                 │
//! │     └── open ledger, rebuild mirror from invoices.txt                  │
//! │                                                                         │
//! │  loop per sale:                                                         │
//! │     select_customer ─► add / edit / remove ─► preview                  │
//! │            │                                                            │
//! │            ├── checkout(now) ──► Receipt, fresh empty bill             │
//! │            └── cancel() ───────► stock restored, fresh empty bill      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every bill mutation is logged at `debug`, low-stock advisories at `warn`.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use mart_core::{
    AddOutcome, Bill, BillItem, BillTotals, CoreError, CustomerId, CustomerStore, EditOutcome,
    Invoice, InvoiceId, LowStockAdvisory, ProductId, GUEST_CUSTOMER_ID,
};

use crate::checkout::{checkout, Receipt};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::ledger::InvoiceLedger;
use crate::tables::{CustomerTable, OfferTable, ProductTable};

/// A single till and its in-progress bill.
#[derive(Debug)]
pub struct Till {
    products: ProductTable,
    offers: OfferTable,
    customers: CustomerTable,
    ledger: InvoiceLedger,
    bill: Bill,
}

impl Till {
    /// Loads every table and the invoice history for `config`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let mut ledger = InvoiceLedger::open(config)?;
        let products =
            ProductTable::load(config.products_path(), config.billing.low_stock_threshold)?;
        let offers = OfferTable::load(config.offers_path())?;
        let customers = CustomerTable::load(config.customers_path())?;
        ledger.rebuild(products.catalog())?;

        info!(data_dir = ?config.data_dir(), "Till ready");
        Ok(Till {
            products,
            offers,
            customers,
            ledger,
            bill: Bill::new(),
        })
    }

    pub fn bill(&self) -> &Bill {
        &self.bill
    }

    pub fn products(&self) -> &ProductTable {
        &self.products
    }

    pub fn products_mut(&mut self) -> &mut ProductTable {
        &mut self.products
    }

    pub fn offers(&self) -> &OfferTable {
        &self.offers
    }

    pub fn offers_mut(&mut self) -> &mut OfferTable {
        &mut self.offers
    }

    pub fn customers(&self) -> &CustomerTable {
        &self.customers
    }

    pub fn customers_mut(&mut self) -> &mut CustomerTable {
        &mut self.customers
    }

    pub fn ledger(&self) -> &InvoiceLedger {
        &self.ledger
    }

    // =========================================================================
    // Bill Operations
    // =========================================================================

    /// Chooses who the sale is for. `0` is the walk-in guest.
    pub fn select_customer(&mut self, customer_id: CustomerId) -> StoreResult<()> {
        if customer_id != GUEST_CUSTOMER_ID && self.customers.lookup(customer_id).is_none() {
            return Err(CoreError::CustomerNotFound(customer_id).into());
        }
        debug!(customer_id, "Customer selected");
        self.bill.select_customer(customer_id);
        Ok(())
    }

    pub fn add(&mut self, product_id: ProductId, quantity: i64) -> StoreResult<AddOutcome> {
        let outcome = self
            .bill
            .add(&mut self.products, &self.offers, product_id, quantity)?;

        debug!(
            product_id,
            quantity,
            line_total = %outcome.item.line_total,
            discount = %outcome.item.discount,
            "Item added"
        );
        if let Some(advisory) = &outcome.low_stock {
            log_low_stock(advisory);
        }
        Ok(outcome)
    }

    pub fn edit(&mut self, product_id: ProductId, quantity: i64) -> StoreResult<EditOutcome> {
        let outcome = self
            .bill
            .edit(&mut self.products, &self.offers, product_id, quantity)?;

        match &outcome {
            EditOutcome::Updated(item) => {
                debug!(product_id, quantity, line_total = %item.line_total, "Item updated")
            }
            EditOutcome::Removed(item) => {
                debug!(product_id, restored = item.quantity, "Item removed by edit")
            }
        }
        Ok(outcome)
    }

    pub fn remove(&mut self, product_id: ProductId) -> Option<BillItem> {
        let removed = self.bill.remove(&mut self.products, product_id);
        if let Some(item) = &removed {
            debug!(product_id, restored = item.quantity, "Item removed");
        }
        removed
    }

    /// Abandons the current sale and starts a fresh guest bill.
    pub fn cancel(&mut self) -> Vec<BillItem> {
        let released = self.bill.cancel(&mut self.products);
        self.bill = Bill::new();
        debug!(lines = released.len(), "Bill cancelled");
        released
    }

    /// Subtotal, GST and total of the bill as it stands.
    pub fn preview(&self) -> BillTotals {
        self.bill.totals(self.ledger.tax_rate())
    }

    /// Commits the current bill. The till starts a fresh guest bill after.
    ///
    /// An empty bill is rejected and left in place.
    pub fn checkout(&mut self, now: NaiveDateTime) -> StoreResult<Receipt> {
        if self.bill.is_empty() {
            return Err(StoreError::EmptyBill);
        }
        let bill = std::mem::take(&mut self.bill);
        checkout(&mut self.ledger, bill, &self.products, &mut self.customers, now)
    }

    /// Looks an invoice up for reprinting.
    pub fn reprint(&self, id: InvoiceId) -> StoreResult<Invoice> {
        self.ledger.find_by_id(id, self.products.catalog())
    }
}

fn log_low_stock(advisory: &LowStockAdvisory) {
    warn!(
        product_id = advisory.product_id,
        name = %advisory.name,
        remaining = advisory.remaining,
        threshold = advisory.threshold,
        "Low stock"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mart_core::{Catalog, Money};
    use tempfile::TempDir;

    fn till() -> (TempDir, StoreConfig, Till) {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::with_data_dir(dir.path());
        std::fs::write(
            config.products_path(),
            "id,name,price,stock,low_threshold\n101,Soap,10.00,100,5\n102,Tea,150.00,6,5\n",
        )
        .unwrap();
        std::fs::write(
            config.offers_path(),
            "id,type,product_id,percent,buy_x,get_y,desc\n1,2,101,0.00,2,1,Buy 2 get 1\n",
        )
        .unwrap();
        std::fs::write(
            config.customers_path(),
            "id,name,phone,email,address,loyalty_points\n4,Asha,98450,asha@example.com,MG Road,0\n",
        )
        .unwrap();

        let till = Till::open(&config).unwrap();
        (dir, config, till)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sale_end_to_end() {
        let (_dir, config, mut till) = till();

        till.select_customer(4).unwrap();
        till.add(101, 9).unwrap();
        let outcome = till.add(102, 1).unwrap();
        assert!(outcome.low_stock.is_some());

        let preview = till.preview();
        assert_eq!(preview.subtotal, Money::from_cents(21000));
        assert_eq!(preview.tax, Money::from_cents(3780));

        let receipt = till.checkout(now()).unwrap();
        assert_eq!(receipt.invoice.id, 1);
        assert_eq!(receipt.loyalty_points, 2);
        assert!(till.bill().is_empty());
        assert_eq!(till.bill().customer_id(), GUEST_CUSTOMER_ID);

        let reopened = Till::open(&config).unwrap();
        assert_eq!(reopened.products().lookup(101).unwrap().stock, 91);
        assert_eq!(reopened.ledger().invoices().len(), 1);
        assert_eq!(reopened.reprint(1).unwrap().total, receipt.invoice.total);
    }

    #[test]
    fn test_cancel_restores_stock() {
        let (_dir, _config, mut till) = till();
        till.add(101, 4).unwrap();
        till.edit(101, 7).unwrap();

        assert_eq!(till.cancel().len(), 1);
        assert_eq!(till.products().lookup(101).unwrap().stock, 100);
    }

    #[test]
    fn test_unknown_customer_rejected() {
        let (_dir, _config, mut till) = till();
        assert!(matches!(
            till.select_customer(42),
            Err(StoreError::Core(CoreError::CustomerNotFound(42)))
        ));
        assert!(till.select_customer(GUEST_CUSTOMER_ID).is_ok());
    }

    #[test]
    fn test_empty_checkout_keeps_customer() {
        let (_dir, _config, mut till) = till();
        till.select_customer(4).unwrap();
        assert!(matches!(till.checkout(now()), Err(StoreError::EmptyBill)));
        assert_eq!(till.bill().customer_id(), 4);
    }
}
