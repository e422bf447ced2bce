//! # Flat-File Tables
//!
//! products.csv, offers.csv and customers.csv, loaded into the in-memory
//! stores from mart-core and written back whole on [`Persist::persist`].
//!
//! ## File Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.csv   id,name,price,stock,low_threshold                      │
//! │                 101,Soap,10.00,100,5                                    │
//! │                                                                         │
//! │  offers.csv     id,type,product_id,percent,buy_x,get_y,desc            │
//! │                 1,2,101,0.00,2,1,Buy 2 get 1 free                       │
//! │                 2,1,102,10.00,0,0,Tea 10% off                           │
//! │                 (type 1 = percent, 2 = buy X get Y; desc may hold ',') │
//! │                                                                         │
//! │  customers.csv  id,name,phone,email,address,loyalty_points             │
//! │                 4,Asha,98450,asha@example.com,MG Road,12                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first line of each file is a header and is always skipped. Rows that
//! do not parse are skipped with a warning; a missing file is an empty
//! table.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use mart_core::validation::{validate_offer, validate_product};
use mart_core::{
    Catalog, CoreResult, Customer, CustomerBook, CustomerId, CustomerStore, Offer, OfferBook,
    OfferKind, OfferResolver, Percent, Product, ProductCatalog, ProductId,
};

use crate::error::{StoreError, StoreResult};

/// Header row of products.csv.
pub const PRODUCTS_HEADER: &str = "id,name,price,stock,low_threshold";

/// Header row of offers.csv.
pub const OFFERS_HEADER: &str = "id,type,product_id,percent,buy_x,get_y,desc";

/// Header row of customers.csv.
pub const CUSTOMERS_HEADER: &str = "id,name,phone,email,address,loyalty_points";

// =============================================================================
// Persist Contract
// =============================================================================

/// A store that can write itself back to disk.
pub trait Persist {
    fn persist(&self) -> StoreResult<()>;
}

// =============================================================================
// Shared Row Handling
// =============================================================================

/// Reads data rows (header excluded) with their 1-based line numbers.
fn read_rows(path: &Path) -> StoreResult<Vec<(usize, String)>> {
    let text = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "Table file not found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    Ok(text
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r').to_string()))
        .collect())
}

fn write_table(path: &Path, header: &str, body: String) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let contents = format!("{}\n{}", header, body);
    std::fs::write(path, contents).map_err(|e| StoreError::io(path, e))?;
    debug!(?path, "Table written");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn field<T: std::str::FromStr>(
    file: &str,
    line: usize,
    name: &str,
    value: &str,
) -> StoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::parse(file, line, format!("{} '{}' is not valid", name, value)))
}

// =============================================================================
// Product Table
// =============================================================================

/// products.csv backed catalog.
#[derive(Debug, Clone)]
pub struct ProductTable {
    path: PathBuf,
    catalog: ProductCatalog,
}

impl ProductTable {
    /// Loads the table. Rows without a threshold column get
    /// `default_threshold`.
    pub fn load(path: impl Into<PathBuf>, default_threshold: i64) -> StoreResult<Self> {
        let path = path.into();
        let file = file_name(&path);
        let mut catalog = ProductCatalog::new();

        for (line, row) in read_rows(&path)? {
            let product = match parse_product(&file, line, &row, default_threshold) {
                Ok(product) => product,
                Err(e) => {
                    warn!(error = %e, "Skipping product row");
                    continue;
                }
            };
            if let Err(e) = validate_product(&product) {
                warn!(file = %file, line, error = %e, "Skipping invalid product");
                continue;
            }
            if let Err(e) = catalog.insert(product) {
                warn!(file = %file, line, error = %e, "Skipping duplicate product");
            }
        }

        info!(?path, count = catalog.len(), "Products loaded");
        Ok(ProductTable { path, catalog })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Catalog maintenance (add, rename, reprice). Call `persist` after.
    pub fn catalog_mut(&mut self) -> &mut ProductCatalog {
        &mut self.catalog
    }
}

fn parse_product(file: &str, line: usize, row: &str, default_threshold: i64) -> StoreResult<Product> {
    let fields: Vec<&str> = row.split(',').collect();
    let (id, name, price, stock, threshold) = match fields.as_slice() {
        [id, name, price, stock] => (id, name, price, stock, None),
        [id, name, price, stock, threshold] => (id, name, price, stock, Some(threshold)),
        _ => {
            return Err(StoreError::parse(
                file,
                line,
                format!("expected 5 fields, found {}", fields.len()),
            ))
        }
    };

    let low_stock_threshold = match threshold {
        Some(value) => field(file, line, "low_threshold", value)?,
        None => default_threshold,
    };

    Ok(Product {
        id: field(file, line, "id", id)?,
        name: name.trim().to_string(),
        price: field(file, line, "price", price)?,
        stock: field(file, line, "stock", stock)?,
        low_stock_threshold,
    })
}

impl Catalog for ProductTable {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.catalog.lookup(id)
    }

    fn adjust_stock(&mut self, id: ProductId, delta: i64) -> CoreResult<i64> {
        self.catalog.adjust_stock(id, delta)
    }

    fn products(&self) -> &[Product] {
        self.catalog.products()
    }
}

impl Persist for ProductTable {
    fn persist(&self) -> StoreResult<()> {
        let mut body = String::new();
        for p in self.catalog.products() {
            let _ = writeln!(
                body,
                "{},{},{},{},{}",
                p.id, p.name, p.price, p.stock, p.low_stock_threshold
            );
        }
        write_table(&self.path, PRODUCTS_HEADER, body)
    }
}

// =============================================================================
// Offer Table
// =============================================================================

/// offers.csv backed offer list.
#[derive(Debug, Clone)]
pub struct OfferTable {
    path: PathBuf,
    offers: OfferBook,
}

impl OfferTable {
    /// Loads the table.
    ///
    /// Offers with out-of-range parameters are kept (they price as no
    /// offer) and reported with a warning.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let file = file_name(&path);
        let mut offers = OfferBook::new();

        for (line, row) in read_rows(&path)? {
            match parse_offer(&file, line, &row) {
                Ok(offer) => {
                    if let Err(e) = validate_offer(&offer) {
                        warn!(file = %file, line, offer_id = offer.id, error = %e, "Offer will not discount");
                    }
                    offers.insert(offer);
                }
                Err(e) => warn!(error = %e, "Skipping offer row"),
            }
        }

        info!(?path, count = offers.len(), "Offers loaded");
        Ok(OfferTable { path, offers })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offers(&self) -> &OfferBook {
        &self.offers
    }

    pub fn offers_mut(&mut self) -> &mut OfferBook {
        &mut self.offers
    }
}

fn parse_offer(file: &str, line: usize, row: &str) -> StoreResult<Offer> {
    let fields: Vec<&str> = row.splitn(7, ',').collect();
    if fields.len() < 6 {
        return Err(StoreError::parse(
            file,
            line,
            format!("expected at least 6 fields, found {}", fields.len()),
        ));
    }

    let id = field(file, line, "id", fields[0])?;
    let code: u8 = field(file, line, "type", fields[1])?;
    let product_id = field(file, line, "product_id", fields[2])?;
    let percent: Percent = field(file, line, "percent", fields[3])?;
    let buy_x = field(file, line, "buy_x", fields[4])?;
    let get_y = field(file, line, "get_y", fields[5])?;
    let description = fields.get(6).map_or("", |d| d.trim());

    let kind = match code {
        1 => OfferKind::Percent(percent),
        2 => OfferKind::BuyXGetY { buy_x, get_y },
        other => {
            return Err(StoreError::parse(file, line, format!("unknown offer type {}", other)))
        }
    };

    Ok(Offer {
        id,
        product_id,
        kind,
        description: description.to_string(),
    })
}

impl OfferResolver for OfferTable {
    fn resolve(&self, product_id: ProductId) -> Option<&Offer> {
        self.offers.resolve(product_id)
    }
}

impl Persist for OfferTable {
    fn persist(&self) -> StoreResult<()> {
        let mut body = String::new();
        for offer in self.offers.offers() {
            let (percent, buy_x, get_y) = match offer.kind {
                OfferKind::Percent(p) => (p, 0, 0),
                OfferKind::BuyXGetY { buy_x, get_y } => (Percent::from_bps(0), buy_x, get_y),
            };
            let _ = writeln!(
                body,
                "{},{},{},{},{},{},{}",
                offer.id,
                offer.kind.code(),
                offer.product_id,
                percent,
                buy_x,
                get_y,
                offer.description
            );
        }
        write_table(&self.path, OFFERS_HEADER, body)
    }
}

// =============================================================================
// Customer Table
// =============================================================================

/// customers.csv backed customer list.
#[derive(Debug, Clone)]
pub struct CustomerTable {
    path: PathBuf,
    customers: CustomerBook,
}

impl CustomerTable {
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let file = file_name(&path);
        let mut customers = CustomerBook::new();

        for (line, row) in read_rows(&path)? {
            let customer = match parse_customer(&file, line, &row) {
                Ok(customer) => customer,
                Err(e) => {
                    warn!(error = %e, "Skipping customer row");
                    continue;
                }
            };
            if let Err(e) = customers.insert(customer) {
                warn!(file = %file, line, error = %e, "Skipping duplicate customer");
            }
        }

        info!(?path, count = customers.len(), "Customers loaded");
        Ok(CustomerTable { path, customers })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn customers(&self) -> &CustomerBook {
        &self.customers
    }

    pub fn customers_mut(&mut self) -> &mut CustomerBook {
        &mut self.customers
    }
}

fn parse_customer(file: &str, line: usize, row: &str) -> StoreResult<Customer> {
    let fields: Vec<&str> = row.split(',').collect();
    let [id, name, phone, email, address, points] = fields.as_slice() else {
        return Err(StoreError::parse(
            file,
            line,
            format!("expected 6 fields, found {}", fields.len()),
        ));
    };

    Ok(Customer {
        id: field(file, line, "id", id)?,
        name: name.trim().to_string(),
        phone: phone.trim().to_string(),
        email: email.trim().to_string(),
        address: address.trim().to_string(),
        loyalty_points: field(file, line, "loyalty_points", points)?,
    })
}

impl CustomerStore for CustomerTable {
    fn lookup(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.lookup(id)
    }

    fn add_loyalty_points(&mut self, id: CustomerId, points: i64) -> CoreResult<i64> {
        self.customers.add_loyalty_points(id, points)
    }
}

impl Persist for CustomerTable {
    fn persist(&self) -> StoreResult<()> {
        let mut body = String::new();
        for c in self.customers.customers() {
            let _ = writeln!(
                body,
                "{},{},{},{},{},{}",
                c.id, c.name, c.phone, c.email, c.address, c.loyalty_points
            );
        }
        write_table(&self.path, CUSTOMERS_HEADER, body)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
