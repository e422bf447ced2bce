//! # Reports
//!
//! Aggregates over the sales log and the invoice file.
//!
//! ## Report Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Report              Reads                 Key                          │
//! │  ──────              ─────                 ───                          │
//! │  sales_summary       sales.csv             timestamp windows            │
//! │  top_customers       sales.csv             customer id (guest skipped)  │
//! │  product_sales       invoices.txt items    product id                   │
//! │  low_stock           products.csv          stock ≤ threshold            │
//! │  write_report        all of the above      → report.txt                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use mart_core::{
    Catalog, CustomerId, CustomerStore, Money, Product, ProductId, GUEST_CUSTOMER_ID,
    TIMESTAMP_FORMAT,
};

use crate::codec::{InvoiceRecord, UNKNOWN_PRODUCT};
use crate::error::{StoreError, StoreResult};
use crate::sales_log::SalesEntry;

/// How many customers the ranking shows by default.
pub const TOP_CUSTOMERS_LIMIT: usize = 5;

/// Title line of report.txt.
pub const REPORT_TITLE: &str = "MART POS REPORT";

// =============================================================================
// Sales Summary
// =============================================================================

/// Revenue over the standard windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    /// Less than 24 hours old, and not in the future.
    pub today: Money,
    /// Less than 7 × 24 hours old, and not in the future.
    pub last_7_days: Money,
    /// Same calendar month and year as `now`.
    pub this_month: Money,
    /// Same calendar year as `now`.
    pub this_year: Money,
    pub grand_total: Money,
    pub invoice_count: usize,
}

pub fn sales_summary(entries: &[SalesEntry], now: NaiveDateTime) -> SalesSummary {
    let mut summary = SalesSummary::default();

    for entry in entries {
        let age = now - entry.timestamp;
        summary.grand_total += entry.total;
        summary.invoice_count += 1;

        // Rows stamped after `now` (clock skew) only count toward the
        // calendar windows.
        if age >= Duration::zero() {
            if age < Duration::days(1) {
                summary.today += entry.total;
            }
            if age < Duration::days(7) {
                summary.last_7_days += entry.total;
            }
        }
        if entry.timestamp.year() == now.year() {
            summary.this_year += entry.total;
            if entry.timestamp.month() == now.month() {
                summary.this_month += entry.total;
            }
        }
    }

    summary
}

// =============================================================================
// Top Customers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRanking {
    pub customer_id: CustomerId,
    pub name: String,
    pub invoices: usize,
    pub revenue: Money,
}

/// Registered customers ranked by number of invoices.
///
/// Ties go to the lower customer id. The guest is never ranked.
pub fn top_customers<S>(entries: &[SalesEntry], customers: &S, limit: usize) -> Vec<CustomerRanking>
where
    S: CustomerStore + ?Sized,
{
    let mut totals: HashMap<CustomerId, (usize, Money)> = HashMap::new();
    for entry in entries.iter().filter(|e| e.customer_id != GUEST_CUSTOMER_ID) {
        let slot = totals.entry(entry.customer_id).or_default();
        slot.0 += 1;
        slot.1 += entry.total;
    }

    let mut ranked: Vec<(CustomerId, (usize, Money))> = totals.into_iter().collect();
    ranked.sort_by(|(a_id, (a_count, _)), (b_id, (b_count, _))| {
        b_count.cmp(a_count).then(a_id.cmp(b_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(customer_id, (invoices, revenue))| CustomerRanking {
            customer_id,
            name: customers
                .lookup(customer_id)
                .map_or_else(|| "Unknown".to_string(), |c| c.name.clone()),
            invoices,
            revenue,
        })
        .collect()
}

// =============================================================================
// Product Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    /// Σ `quantity × unit_price − discount` over every sold line.
    pub revenue: Money,
}

/// Units sold and revenue per product, ordered by product id.
///
/// Products with nothing sold are left out.
pub fn product_sales<C>(records: &[InvoiceRecord], catalog: &C) -> Vec<ProductSales>
where
    C: Catalog + ?Sized,
{
    let mut totals: BTreeMap<ProductId, (i64, Money)> = BTreeMap::new();
    for row in records.iter().flat_map(|r| &r.items) {
        let slot = totals.entry(row.product_id).or_default();
        slot.0 += row.quantity;
        slot.1 += row.line_total();
    }

    totals
        .into_iter()
        .filter(|(_, (quantity, _))| *quantity > 0)
        .map(|(product_id, (quantity, revenue))| ProductSales {
            product_id,
            name: catalog
                .lookup(product_id)
                .map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
            quantity,
            revenue,
        })
        .collect()
}

// =============================================================================
// Low Stock
// =============================================================================

/// Products at or below their threshold, in catalog order.
pub fn low_stock<C>(catalog: &C) -> Vec<&Product>
where
    C: Catalog + ?Sized,
{
    catalog.low_stock()
}

// =============================================================================
// Report File
// =============================================================================

/// Renders report.txt.
pub fn render_report(
    entries: &[SalesEntry],
    products: &[ProductSales],
    generated: NaiveDateTime,
) -> String {
    let grand: Money = entries.iter().map(|e| e.total).sum();

    let mut out = String::new();
    let _ = writeln!(out, "{}", REPORT_TITLE);
    let _ = writeln!(out, "Generated: {}", generated.format(TIMESTAMP_FORMAT));
    out.push('\n');
    let _ = writeln!(out, "Total invoices: {}", entries.len());
    let _ = writeln!(out, "Grand total: {}", grand);
    out.push('\n');
    out.push_str("Product-wise sales:\n");
    for p in products {
        let _ = writeln!(
            out,
            "Product {} ({}): Sold {}, Revenue {}",
            p.product_id, p.name, p.quantity, p.revenue
        );
    }
    out
}

/// Writes report.txt, replacing any previous report.
pub fn write_report(
    path: &Path,
    entries: &[SalesEntry],
    products: &[ProductSales],
    generated: NaiveDateTime,
) -> StoreResult<()> {
    let text = render_report(entries, products, generated);
    std::fs::write(path, text).map_err(|e| StoreError::io(path, e))?;
    info!(?path, invoices = entries.len(), "Report written");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{InvoiceHeader, ItemRow};
    use chrono::NaiveDate;
    use mart_core::{Customer, CustomerBook, ProductCatalog};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sale(id: u32, customer_id: CustomerId, ts: NaiveDateTime, cents: i64) -> SalesEntry {
        SalesEntry {
            invoice_id: id,
            timestamp: ts,
            customer_id,
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_sales_summary_windows() {
        let now = at(2025, 3, 10, 12);
        let entries = vec![
            sale(1, 0, at(2025, 3, 10, 9), 100),  // today
            sale(2, 0, at(2025, 3, 5, 12), 200),  // 5 days
            sale(3, 0, at(2025, 3, 1, 8), 400),   // this month, 9 days
            sale(4, 0, at(2025, 1, 15, 8), 800),  // this year
            sale(5, 0, at(2024, 12, 31, 8), 1600), // last year
        ];

        let summary = sales_summary(&entries, now);

        assert_eq!(summary.today, Money::from_cents(100));
        assert_eq!(summary.last_7_days, Money::from_cents(300));
        assert_eq!(summary.this_month, Money::from_cents(700));
        assert_eq!(summary.this_year, Money::from_cents(1500));
        assert_eq!(summary.grand_total, Money::from_cents(3100));
        assert_eq!(summary.invoice_count, 5);
    }

    #[test]
    fn test_sales_summary_ignores_future_rows_in_rolling_windows() {
        let now = at(2025, 3, 10, 12);
        let entries = vec![
            sale(1, 0, at(2025, 3, 10, 11), 100),
            sale(2, 0, at(2025, 3, 10, 18), 200), // later today
            sale(3, 0, at(2025, 3, 14, 8), 400),  // four days ahead
        ];

        let summary = sales_summary(&entries, now);

        assert_eq!(summary.today, Money::from_cents(100));
        assert_eq!(summary.last_7_days, Money::from_cents(100));
        assert_eq!(summary.this_month, Money::from_cents(700));
        assert_eq!(summary.this_year, Money::from_cents(700));
        assert_eq!(summary.grand_total, Money::from_cents(700));
    }

    #[test]
    fn test_top_customers_ranking() {
        let customers: CustomerBook = [Customer::new(2, "Asha"), Customer::new(3, "Ravi")]
            .into_iter()
            .collect();
        let ts = at(2025, 3, 1, 8);
        let entries = vec![
            sale(1, 3, ts, 100),
            sale(2, 2, ts, 500),
            sale(3, 0, ts, 9_999),
            sale(4, 0, ts, 9_999),
            sale(5, 0, ts, 9_999),
            sale(6, 7, ts, 50),
            sale(7, 7, ts, 50),
        ];

        let ranked = top_customers(&entries, &customers, TOP_CUSTOMERS_LIMIT);
        let order: Vec<CustomerId> = ranked.iter().map(|r| r.customer_id).collect();

        assert_eq!(order, vec![7, 2, 3]);
        assert_eq!(ranked[0].name, "Unknown");
        assert_eq!(ranked[0].revenue, Money::from_cents(100));
        assert_eq!(ranked[1].name, "Asha");

        assert_eq!(top_customers(&entries, &customers, 1).len(), 1);
    }

    #[test]
    fn test_product_sales_and_report() {
        let catalog: ProductCatalog = [Product::new(1, "Rice", Money::from_cents(6000), 3)]
            .into_iter()
            .collect();
        let header = InvoiceHeader {
            id: 1,
            timestamp: at(2025, 3, 1, 8),
            customer_id: 0,
            pre_tax_total: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        };
        let records = vec![
            InvoiceRecord {
                line: 1,
                header: header.clone(),
                items: vec![
                    ItemRow {
                        product_id: 9,
                        quantity: 2,
                        unit_price: Money::from_cents(500),
                        discount: Money::from_cents(100),
                    },
                    ItemRow {
                        product_id: 1,
                        quantity: 1,
                        unit_price: Money::from_cents(6000),
                        discount: Money::zero(),
                    },
                ],
            },
            InvoiceRecord {
                line: 5,
                header,
                items: vec![ItemRow {
                    product_id: 1,
                    quantity: 2,
                    unit_price: Money::from_cents(6000),
                    discount: Money::from_cents(600),
                }],
            },
        ];

        let sales = product_sales(&records, &catalog);
        assert_eq!(
            sales,
            vec![
                ProductSales {
                    product_id: 1,
                    name: "Rice".to_string(),
                    quantity: 3,
                    revenue: Money::from_cents(17400),
                },
                ProductSales {
                    product_id: 9,
                    name: "Unknown".to_string(),
                    quantity: 2,
                    revenue: Money::from_cents(900),
                },
            ]
        );

        let entries = vec![sale(1, 0, at(2025, 3, 1, 8), 19_234)];
        let report = render_report(&entries, &sales, at(2025, 3, 2, 9));
        assert_eq!(
            report,
            "MART POS REPORT\n\
             Generated: 2025-03-02 09:00:00\n\
             \n\
             Total invoices: 1\n\
             Grand total: 192.34\n\
             \n\
             Product-wise sales:\n\
             Product 1 (Rice): Sold 3, Revenue 174.00\n\
             Product 9 (Unknown): Sold 2, Revenue 9.00\n"
        );

        assert_eq!(low_stock(&catalog).len(), 1);
    }
}
