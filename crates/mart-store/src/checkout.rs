//! # Checkout
//!
//! Commits a bill and carries out the follow-up saves.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout(ledger, bill, catalog, customers, now)                       │
//! │                                                                         │
//! │  1. ledger.finalize(bill) ───► invoice + sales row   ◄── COMMIT POINT  │
//! │  2. catalog.persist() ──────► products.csv (reserved stock now saved) │
//! │  3. registered customer? ───► add ⌊pre-tax / 100⌋ points              │
//! │                               customers.persist()                      │
//! │                                                                         │
//! │  Step 1 failing records nothing. Steps 2-3 failing leave the invoice   │
//! │  recorded; the error is returned for manual reconciliation.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use mart_core::{Bill, CustomerStore, Invoice, GUEST_CUSTOMER_ID};

use crate::error::StoreResult;
use crate::ledger::InvoiceLedger;
use crate::tables::Persist;

/// What the customer walks away with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub invoice: Invoice,

    /// Points awarded for this sale (0 for guests and unknown customers).
    pub loyalty_points: i64,

    /// Customer's balance after this sale, if they earned points.
    pub points_balance: Option<i64>,
}

/// Finalizes `bill` and saves stock and loyalty changes.
pub fn checkout<C, U>(
    ledger: &mut InvoiceLedger,
    bill: Bill,
    catalog: &C,
    customers: &mut U,
    now: NaiveDateTime,
) -> StoreResult<Receipt>
where
    C: Persist + ?Sized,
    U: CustomerStore + Persist + ?Sized,
{
    let invoice = ledger.finalize(bill, now)?;

    catalog.persist().inspect_err(|e| {
        error!(invoice_id = invoice.id, error = %e, "Invoice recorded but stock not saved");
    })?;

    let mut receipt = Receipt {
        loyalty_points: 0,
        points_balance: None,
        invoice,
    };

    let customer_id = receipt.invoice.customer_id;
    if customer_id != GUEST_CUSTOMER_ID && customers.lookup(customer_id).is_some() {
        let points = receipt.invoice.loyalty_points();
        let balance = customers.add_loyalty_points(customer_id, points)?;

        customers.persist().inspect_err(|e| {
            error!(
                invoice_id = receipt.invoice.id,
                customer_id,
                error = %e,
                "Invoice recorded but loyalty points not saved"
            );
        })?;

        info!(customer_id, points, balance, "Loyalty points awarded");
        receipt.loyalty_points = points;
        receipt.points_balance = Some(balance);
    }

    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use crate::tables::{CustomerTable, ProductTable};
    use chrono::NaiveDate;
    use mart_core::{Catalog, Money, OfferBook};
    use tempfile::TempDir;

    struct Shop {
        _dir: TempDir,
        config: StoreConfig,
        products: ProductTable,
        customers: CustomerTable,
        ledger: InvoiceLedger,
    }

    fn shop() -> Shop {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::with_data_dir(dir.path());
        std::fs::write(
            config.products_path(),
            "id,name,price,stock,low_threshold\n1,Basmati 5kg,250.75,10,2\n",
        )
        .unwrap();
        std::fs::write(
            config.customers_path(),
            "id,name,phone,email,address,loyalty_points\n4,Asha,98450,asha@example.com,MG Road,10\n",
        )
        .unwrap();

        Shop {
            products: ProductTable::load(config.products_path(), 5).unwrap(),
            customers: CustomerTable::load(config.customers_path()).unwrap(),
            ledger: InvoiceLedger::open(&config).unwrap(),
            config,
            _dir: dir,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_checkout_awards_points_and_saves() {
        let mut shop = shop();
        let mut bill = Bill::for_customer(4);
        bill.add(&mut shop.products, &OfferBook::new(), 1, 1).unwrap();

        let receipt = checkout(&mut shop.ledger, bill, &shop.products, &mut shop.customers, now())
            .unwrap();

        assert_eq!(receipt.invoice.pre_tax_total, Money::from_cents(25075));
        assert_eq!(receipt.loyalty_points, 2);
        assert_eq!(receipt.points_balance, Some(12));

        let products = ProductTable::load(shop.config.products_path(), 5).unwrap();
        assert_eq!(products.lookup(1).unwrap().stock, 9);
        let customers = CustomerTable::load(shop.config.customers_path()).unwrap();
        assert_eq!(customers.lookup(4).unwrap().loyalty_points, 12);
    }

    #[test]
    fn test_guest_and_unknown_customers_earn_nothing() {
        let mut shop = shop();

        for customer_id in [GUEST_CUSTOMER_ID, 99] {
            let mut bill = Bill::for_customer(customer_id);
            bill.add(&mut shop.products, &OfferBook::new(), 1, 1).unwrap();
            let receipt =
                checkout(&mut shop.ledger, bill, &shop.products, &mut shop.customers, now())
                    .unwrap();
            assert_eq!(receipt.loyalty_points, 0);
            assert_eq!(receipt.points_balance, None);
        }
        assert_eq!(shop.customers.lookup(4).unwrap().loyalty_points, 10);
    }

    #[test]
    fn test_empty_bill_writes_nothing() {
        let mut shop = shop();
        let err = checkout(
            &mut shop.ledger,
            Bill::new(),
            &shop.products,
            &mut shop.customers,
            now(),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::EmptyBill));
        assert_eq!(shop.ledger.next_invoice_id().unwrap(), 1);
    }
}
