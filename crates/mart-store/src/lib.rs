//! # mart-store: Durable Side of Mart POS
//!
//! This crate owns every file the till reads or writes: the append-only
//! invoice file, the sales log, the three CSV tables and `mart.toml`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mart POS Data Flow                               │
//! │                                                                         │
//! │  Cashier front end / mart-report                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mart-store (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐    ┌───────────────┐    ┌───────────────┐  │   │
//! │  │   │     Till     │    │ InvoiceLedger │    │    Reports    │  │   │
//! │  │   │  (till.rs)   │───►│  (ledger.rs)  │◄───│ (reports.rs)  │  │   │
//! │  │   │              │    │  codec.rs     │    │               │  │   │
//! │  │   │ Bill session │    │  sales_log.rs │    │ summary, top, │  │   │
//! │  │   │ checkout.rs  │    │               │    │ product-wise  │  │   │
//! │  │   └──────┬───────┘    └───────────────┘    └───────────────┘  │   │
//! │  │          │                                                      │   │
//! │  │          ▼                                                      │   │
//! │  │   tables.rs: products.csv / offers.csv / customers.csv         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  data dir (mart.toml `paths.data_dir`, MART_DATA_DIR)           │   │
//! │  │  invoices.txt  sales.csv  products.csv  ...  report.txt         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `mart.toml` loading, defaults and env overrides
//! - [`codec`] - Invoice file line grammar and block scanner
//! - [`sales_log`] - One row per finalized invoice
//! - [`ledger`] - Invoice numbering, finalization, lookup
//! - [`tables`] - Product, offer and customer CSV tables
//! - [`checkout`] - Commit a bill, save stock, award loyalty points
//! - [`till`] - A till session owning the tables and the open bill
//! - [`reports`] - Sales summary, top customers, product-wise sales
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mart_store::{StoreConfig, Till};
//!
//! let config = StoreConfig::load(None)?;
//! let mut till = Till::open(&config)?;
//!
//! till.select_customer(4)?;
//! till.add(101, 9)?;
//! let receipt = till.checkout(chrono::Local::now().naive_local())?;
//! println!("Invoice {} total {}", receipt.invoice.id, receipt.invoice.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reports;
pub mod sales_log;
pub mod tables;
pub mod till;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{checkout, Receipt};
pub use config::{BillingConfig, PathsConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use ledger::InvoiceLedger;
pub use sales_log::{SalesEntry, SalesLog};
pub use tables::{CustomerTable, OfferTable, Persist, ProductTable};
pub use till::Till;

// Report re-exports for convenience
pub use reports::{
    low_stock, product_sales, render_report, sales_summary, top_customers, write_report,
    CustomerRanking, ProductSales, SalesSummary,
};
