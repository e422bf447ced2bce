//! # Mart Report Tool
//!
//! Read-only reports and invoice reprints over a shop's data directory.
//!
//! ## Usage
//! ```bash
//! # List every invoice (optionally for one customer)
//! cargo run -p mart-store --bin mart-report -- list
//! cargo run -p mart-store --bin mart-report -- list --customer 4
//!
//! # Reprint invoice 12
//! cargo run -p mart-store --bin mart-report -- reprint 12
//!
//! # Sales windows, top customers, product-wise sales, low stock
//! cargo run -p mart-store --bin mart-report -- summary
//! cargo run -p mart-store --bin mart-report -- top --limit 5
//! cargo run -p mart-store --bin mart-report -- products
//! cargo run -p mart-store --bin mart-report -- low-stock
//!
//! # Write report.txt (or another file)
//! cargo run -p mart-store --bin mart-report -- write-report --output ./report.txt
//!
//! # Point at another shop
//! cargo run -p mart-store --bin mart-report -- --data-dir /srv/mart/data summary
//! ```
//!
//! Log output goes to stderr; set `RUST_LOG=debug` for codec decisions.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use mart_core::{CustomerId, CustomerStore, InvoiceId, TIMESTAMP_FORMAT};
use mart_store::reports::TOP_CUSTOMERS_LIMIT;
use mart_store::{
    low_stock, product_sales, sales_summary, top_customers, write_report, CustomerTable,
    InvoiceLedger, ProductTable, StoreConfig, StoreResult,
};

#[derive(Debug, Parser)]
#[command(name = "mart-report", about = "Mart POS reports and reprints", long_about = None)]
struct Cli {
    /// Path to mart.toml
    #[arg(long, global = true, env = "MART_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory; overrides the config file and MART_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List invoice headers
    List {
        /// Only invoices for this customer
        #[arg(long)]
        customer: Option<CustomerId>,
    },
    /// Print one invoice in full
    Reprint { id: InvoiceId },
    /// Revenue today, last 7 days, this month, this year
    Summary,
    /// Customers with the most invoices
    Top {
        #[arg(long, default_value_t = TOP_CUSTOMERS_LIMIT)]
        limit: usize,
    },
    /// Units sold and revenue per product
    Products,
    /// Products at or below their low-stock threshold
    LowStock,
    /// Write the plain-text sales report
    WriteReport {
        /// Defaults to `paths.report` in the data directory
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mart-report failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=mart_store=trace` - Show trace for the storage crate only
/// - Default: INFO, DEBUG for mart crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mart=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> StoreResult<()> {
    let mut config = StoreConfig::load(cli.config)?;
    if let Some(dir) = cli.data_dir {
        config.paths.data_dir = dir;
    }
    let now = Local::now().naive_local();

    match cli.command {
        Commands::List { customer } => list(&config, customer),
        Commands::Reprint { id } => reprint(&config, id),
        Commands::Summary => summary(&config, now),
        Commands::Top { limit } => top(&config, limit),
        Commands::Products => products(&config),
        Commands::LowStock => low_stock_report(&config),
        Commands::WriteReport { output } => {
            let path = output.unwrap_or_else(|| config.report_path());
            report(&config, path, now)
        }
    }
}

fn load_products(config: &StoreConfig) -> StoreResult<ProductTable> {
    ProductTable::load(config.products_path(), config.billing.low_stock_threshold)
}

// =============================================================================
// Commands
// =============================================================================

fn list(config: &StoreConfig, customer: Option<CustomerId>) -> StoreResult<()> {
    let ledger = InvoiceLedger::open(config)?;
    let headers: Vec<_> = ledger
        .summaries()?
        .into_iter()
        .filter(|h| customer.map_or(true, |c| h.customer_id == c))
        .collect();

    if headers.is_empty() {
        println!("No invoices found.");
        return Ok(());
    }

    println!("{:>6}  {:<19}  {:>8}  {:>12}", "ID", "Date", "Customer", "Total");
    for h in &headers {
        println!(
            "{:>6}  {:<19}  {:>8}  {:>12}",
            h.id,
            h.timestamp.format(TIMESTAMP_FORMAT),
            h.customer_id,
            h.total
        );
    }
    Ok(())
}

fn reprint(config: &StoreConfig, id: InvoiceId) -> StoreResult<()> {
    let products = load_products(config)?;
    let ledger = InvoiceLedger::open(config)?;
    let invoice = ledger.find_by_id(id, products.catalog())?;

    println!("Invoice #{}", invoice.id);
    println!("Date: {}", invoice.timestamp_text());
    println!("Customer: {}", invoice.customer_id);
    println!();
    println!("{:<24} {:>5} {:>10} {:>10} {:>12}", "Item", "Qty", "Price", "Discount", "Total");
    for item in &invoice.items {
        println!(
            "{:<24} {:>5} {:>10} {:>10} {:>12}",
            item.name, item.quantity, item.unit_price, item.discount, item.line_total
        );
    }
    println!();
    println!("Subtotal: {}", invoice.pre_tax_total);
    println!("GST ({}): {}", ledger.tax_rate(), invoice.tax);
    println!("Total: {}", invoice.total);
    Ok(())
}

fn summary(config: &StoreConfig, now: NaiveDateTime) -> StoreResult<()> {
    let ledger = InvoiceLedger::open(config)?;
    let s = sales_summary(&ledger.sales_log().entries()?, now);

    println!("Today:        {}", s.today);
    println!("Last 7 days:  {}", s.last_7_days);
    println!("This month:   {}", s.this_month);
    println!("This year:    {}", s.this_year);
    println!("Grand total:  {} ({} invoices)", s.grand_total, s.invoice_count);
    Ok(())
}

fn top(config: &StoreConfig, limit: usize) -> StoreResult<()> {
    let ledger = InvoiceLedger::open(config)?;
    let customers = CustomerTable::load(config.customers_path())?;
    let ranked = top_customers(&ledger.sales_log().entries()?, &customers, limit);

    if ranked.is_empty() {
        println!("No registered customer sales yet.");
        return Ok(());
    }
    for (rank, r) in ranked.iter().enumerate() {
        let points = customers.lookup(r.customer_id).map_or(0, |c| c.loyalty_points);
        println!(
            "{}. {} (#{}) - {} invoices, revenue {}, {} points",
            rank + 1,
            r.name,
            r.customer_id,
            r.invoices,
            r.revenue,
            points
        );
    }
    Ok(())
}

fn products(config: &StoreConfig) -> StoreResult<()> {
    let table = load_products(config)?;
    let ledger = InvoiceLedger::open(config)?;

    for p in product_sales(&ledger.records()?, table.catalog()) {
        println!(
            "Product {} ({}): Sold {}, Revenue {}",
            p.product_id, p.name, p.quantity, p.revenue
        );
    }
    Ok(())
}

fn low_stock_report(config: &StoreConfig) -> StoreResult<()> {
    let table = load_products(config)?;
    let low = low_stock(table.catalog());

    if low.is_empty() {
        println!("All products above their low-stock threshold.");
        return Ok(());
    }
    for p in low {
        println!(
            "{} ({}): {} left, threshold {}",
            p.name, p.id, p.stock, p.low_stock_threshold
        );
    }
    Ok(())
}

fn report(config: &StoreConfig, path: PathBuf, now: NaiveDateTime) -> StoreResult<()> {
    let table = load_products(config)?;
    let ledger = InvoiceLedger::open(config)?;
    let entries = ledger.sales_log().entries()?;
    let sales = product_sales(&ledger.records()?, table.catalog());

    write_report(&path, &entries, &sales, now)?;
    println!("Report written to {}", path.display());
    Ok(())
}
