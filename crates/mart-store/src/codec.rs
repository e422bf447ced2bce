//! # Invoice Codec
//!
//! Reads and writes the invoice file, one block per sale.
//!
//! ## Record Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INVOICE_ID:12|2025-01-02 09:00:00|CUST:4|PRE_GST:60.00|GST:10.80|TOTAL:70.80
//! │  101,9,10.00,30.00          ← product_id,quantity,unit_price,discount   │
//! │  205,1,45.50,0.00                                                       │
//! │  ---                        ← terminator                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every amount is written with exactly two decimals. `line_total` is not
//! stored; decoding recomputes it as `quantity × unit_price − discount`.
//!
//! ## Line Classification
//! ```text
//! parse_line(text)
//!      │
//!      ├── "INVOICE_ID:" + 6 valid fields ──► Line::Header
//!      ├── "INVOICE_ID:" otherwise ─────────► Line::MalformedHeader
//!      ├── "---" ───────────────────────────► Line::Terminator
//!      ├── 4 valid comma fields ────────────► Line::Item
//!      └── anything else ───────────────────► Line::Unrecognized
//! ```
//!
//! ## Scanning Rules
//! - A malformed header skips its whole block (reported as `Skipped`)
//! - Unrecognized lines inside a block are ignored
//! - Item lines outside any block are ignored
//! - A block cut off at end of file (no `---`) is still returned
//! - Bytes that are not UTF-8 are read lossily, so a damaged line is just
//!   another unrecognized line (or a malformed header)
//! - Item rows need a positive quantity, non-negative price and discount,
//!   and a line value that fits in `Money`

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{self, BufRead};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mart_core::{
    BillItem, Catalog, CustomerId, Invoice, InvoiceId, Money, ProductId, TIMESTAMP_FORMAT,
};

/// Marks the first line of every invoice block.
pub const HEADER_PREFIX: &str = "INVOICE_ID:";

/// Closes an invoice block.
pub const TERMINATOR: &str = "---";

/// Name shown for products no longer in the catalog.
pub const UNKNOWN_PRODUCT: &str = "Unknown";

// =============================================================================
// Line Grammar
// =============================================================================

/// The header line of an invoice block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    pub id: InvoiceId,
    pub timestamp: NaiveDateTime,
    pub customer_id: CustomerId,
    pub pre_tax_total: Money,
    pub tax: Money,
    pub total: Money,
}

/// One stored item line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
}

impl ItemRow {
    /// `quantity × unit_price − discount`.
    ///
    /// Rows read by [`parse_line`] are checked so this cannot overflow or go
    /// below zero.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity - self.discount
    }
}

/// A classified line of the invoice file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Header(InvoiceHeader),
    MalformedHeader(String),
    Item(ItemRow),
    Terminator,
    Unrecognized(String),
}

/// Classifies one line (without its line break).
pub fn parse_line(text: &str) -> Line {
    let text = text.trim_end_matches(['\r', '\n']);

    if text.starts_with(HEADER_PREFIX) {
        return match parse_header(text) {
            Ok(header) => Line::Header(header),
            Err(reason) => Line::MalformedHeader(reason),
        };
    }
    if text.trim() == TERMINATOR {
        return Line::Terminator;
    }
    match parse_item(text) {
        Ok(row) => Line::Item(row),
        Err(reason) => Line::Unrecognized(reason),
    }
}

fn parse_header(text: &str) -> Result<InvoiceHeader, String> {
    let fields: Vec<&str> = text.split('|').collect();
    let [id, timestamp, customer, pre_tax, tax, total] = fields.as_slice() else {
        return Err(format!("expected 6 header fields, found {}", fields.len()));
    };

    let id = tagged(id, HEADER_PREFIX)?
        .parse::<InvoiceId>()
        .map_err(|_| format!("bad invoice id in '{}'", id))?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| format!("bad timestamp '{}': {}", timestamp, e))?;
    let customer_id = tagged(customer, "CUST:")?
        .parse::<CustomerId>()
        .map_err(|_| format!("bad customer id in '{}'", customer))?;

    Ok(InvoiceHeader {
        id,
        timestamp,
        customer_id,
        pre_tax_total: tagged_money(pre_tax, "PRE_GST:")?,
        tax: tagged_money(tax, "GST:")?,
        total: tagged_money(total, "TOTAL:")?,
    })
}

fn tagged<'a>(field: &'a str, tag: &str) -> Result<&'a str, String> {
    field
        .strip_prefix(tag)
        .map(str::trim)
        .ok_or_else(|| format!("expected '{}' in '{}'", tag, field))
}

fn tagged_money(field: &str, tag: &str) -> Result<Money, String> {
    tagged(field, tag)?
        .parse()
        .map_err(|e| format!("{} {}", tag.trim_end_matches(':'), e))
}

fn parse_item(text: &str) -> Result<ItemRow, String> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    let [product_id, quantity, unit_price, discount] = fields.as_slice() else {
        return Err(format!("expected 4 item fields, found {}", fields.len()));
    };

    let row = ItemRow {
        product_id: product_id
            .parse()
            .map_err(|_| format!("bad product id '{}'", product_id))?,
        quantity: quantity
            .parse()
            .map_err(|_| format!("bad quantity '{}'", quantity))?,
        unit_price: unit_price.parse().map_err(|e| format!("unit price {}", e))?,
        discount: discount.parse().map_err(|e| format!("discount {}", e))?,
    };

    if row.quantity <= 0 {
        return Err(format!("quantity {} is not positive", row.quantity));
    }
    if row.unit_price.is_negative() {
        return Err(format!("unit price {} is negative", row.unit_price));
    }
    if row.discount.is_negative() {
        return Err(format!("discount {} is negative", row.discount));
    }
    let gross = row
        .unit_price
        .checked_mul(row.quantity)
        .ok_or_else(|| format!("{} x {} overflows", row.quantity, row.unit_price))?;
    if row.discount > gross {
        return Err(format!("discount {} exceeds line value {}", row.discount, gross));
    }
    Ok(row)
}

/// Invoice id of a header line, read as leniently as possible.
///
/// Numbering must see every id ever written, even in blocks whose other
/// header fields are damaged.
pub fn header_id(text: &str) -> Option<InvoiceId> {
    let rest = text.strip_prefix(HEADER_PREFIX)?.trim_start();
    let digits: &str = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    digits.parse().ok()
}

// =============================================================================
// Encoding
// =============================================================================

/// Renders one invoice block, including the trailing `---` line.
///
/// ## Example
/// ```text
/// INVOICE_ID:1|2025-01-02 09:00:00|CUST:0|PRE_GST:60.00|GST:10.80|TOTAL:70.80
/// 101,9,10.00,30.00
/// ---
/// ```
pub fn encode(invoice: &Invoice) -> String {
    let mut block = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        block,
        "{}{}|{}|CUST:{}|PRE_GST:{}|GST:{}|TOTAL:{}",
        HEADER_PREFIX,
        invoice.id,
        invoice.timestamp_text(),
        invoice.customer_id,
        invoice.pre_tax_total,
        invoice.tax,
        invoice.total
    );
    for item in &invoice.items {
        let _ = writeln!(
            block,
            "{},{},{},{}",
            item.product_id, item.quantity, item.unit_price, item.discount
        );
    }
    block.push_str(TERMINATOR);
    block.push('\n');
    block
}

// =============================================================================
// Decoding
// =============================================================================

/// One stored invoice block, before product names are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// 1-based line number of the header.
    pub line: usize,
    pub header: InvoiceHeader,
    pub items: Vec<ItemRow>,
}

impl InvoiceRecord {
    /// Builds the invoice, naming products from the catalog as it is now.
    ///
    /// A product renamed after the sale shows its new name; a deleted one
    /// shows [`UNKNOWN_PRODUCT`].
    pub fn decode<C>(&self, catalog: &C) -> Invoice
    where
        C: Catalog + ?Sized,
    {
        let items = self
            .items
            .iter()
            .map(|row| BillItem {
                product_id: row.product_id,
                name: catalog
                    .lookup(row.product_id)
                    .map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
                quantity: row.quantity,
                unit_price: row.unit_price,
                discount: row.discount,
                line_total: row.line_total(),
            })
            .collect();

        Invoice {
            id: self.header.id,
            timestamp: self.header.timestamp,
            customer_id: self.header.customer_id,
            items,
            pre_tax_total: self.header.pre_tax_total,
            tax: self.header.tax,
            total: self.header.total,
        }
    }
}

/// What the scanner found for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    Invoice(InvoiceRecord),
    /// A block that could not be read; scanning carries on after it.
    Skipped { line: usize, reason: String },
}

/// Streams invoice blocks out of a reader.
pub struct Scanner<R> {
    reader: R,
    line_no: usize,
    open: Option<InvoiceRecord>,
    ready: VecDeque<Scanned>,
    done: bool,
}

/// Scans an invoice file block by block.
///
/// ## Example
/// ```rust
/// use mart_store::codec::{scan, Scanned};
///
/// let text = "INVOICE_ID:1|2025-01-02 09:00:00|CUST:0|PRE_GST:10.00|GST:1.80|TOTAL:11.80\n\
///             101,1,10.00,0.00\n\
///             ---\n\
///             INVOICE_ID:2|garbage\n\
///             ---\n";
///
/// let found: Vec<Scanned> = scan(text.as_bytes()).collect::<Result<_, _>>().unwrap();
/// assert!(matches!(found[0], Scanned::Invoice(_)));
/// assert!(matches!(found[1], Scanned::Skipped { line: 4, .. }));
/// ```
pub fn scan<R: BufRead>(reader: R) -> Scanner<R> {
    Scanner {
        reader,
        line_no: 0,
        open: None,
        ready: VecDeque::new(),
        done: false,
    }
}

impl<R: BufRead> Scanner<R> {
    fn close_block(&mut self) {
        if let Some(record) = self.open.take() {
            debug!(id = record.header.id, items = record.items.len(), "Decoded invoice block");
            self.ready.push_back(Scanned::Invoice(record));
        }
    }

    fn feed(&mut self, text: &str) {
        match parse_line(text) {
            Line::Header(header) => {
                if let Some(open) = &self.open {
                    warn!(line = open.line, id = open.header.id, "Invoice block has no terminator");
                }
                self.close_block();
                self.open = Some(InvoiceRecord {
                    line: self.line_no,
                    header,
                    items: Vec::new(),
                });
            }
            Line::MalformedHeader(reason) => {
                self.close_block();
                warn!(line = self.line_no, %reason, "Skipping malformed invoice block");
                self.ready.push_back(Scanned::Skipped {
                    line: self.line_no,
                    reason,
                });
            }
            Line::Item(row) => match &mut self.open {
                Some(record) => record.items.push(row),
                None => debug!(line = self.line_no, "Ignoring item line outside a block"),
            },
            Line::Terminator => self.close_block(),
            Line::Unrecognized(reason) => {
                if !text.trim().is_empty() {
                    debug!(line = self.line_no, %reason, "Ignoring unrecognized line");
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = io::Result<Scanned>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(found) = self.ready.pop_front() {
                return Some(Ok(found));
            }
            if self.done {
                return None;
            }

            let mut raw = Vec::new();
            match self.reader.read_until(b'\n', &mut raw) {
                Ok(0) => {
                    self.done = true;
                    if let Some(open) = &self.open {
                        warn!(line = open.line, id = open.header.id, "Invoice file ends inside a block");
                    }
                    self.close_block();
                }
                Ok(_) => {
                    self.line_no += 1;
                    let text = String::from_utf8_lossy(&raw);
                    self.feed(&text);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Largest invoice id in the file, if any.
///
/// Lines that are not valid UTF-8 are read lossily, never rejected.
pub fn max_invoice_id<R: BufRead>(mut reader: R) -> io::Result<Option<InvoiceId>> {
    let mut max = None;
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(max);
        }
        if let Some(id) = header_id(&String::from_utf8_lossy(&raw)) {
            max = max.max(Some(id));
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
