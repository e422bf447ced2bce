//! # Invoice Ledger
//!
//! The append-only invoice file, its in-memory mirror, and invoice
//! numbering.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    finalize(bill, now)                                  │
//! │                                                                         │
//! │  1. bill empty? ──────────────► EmptyBill (nothing written)            │
//! │  2. next_invoice_id() ────────► max id in invoices.txt + 1             │
//! │  3. bill.into_invoice() ──────► tax, total, timestamp                  │
//! │  4. append block + sync_all ──► invoices.txt      ◄── COMMIT POINT     │
//! │  5. append row + sync_all ────► sales.csv                              │
//! │  6. push ─────────────────────► in-memory mirror                       │
//! │                                                                         │
//! │  A failure at 4 or 5 is an Io error. Stock reserved by the bill is    │
//! │  NOT returned; the sale needs manual reconciliation.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Source of Truth
//! The file is authoritative. The mirror only holds what this process has
//! written or what [`InvoiceLedger::rebuild`] read back, so numbering and
//! lookups always fall back to the file.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, SubsecRound};
use tracing::{debug, info, warn};

use mart_core::{Bill, Catalog, Invoice, InvoiceId, TaxRate};

use crate::codec::{self, InvoiceHeader, InvoiceRecord, Scanned};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::sales_log::{SalesEntry, SalesLog};

/// Durable invoice store plus its mirror.
#[derive(Debug)]
pub struct InvoiceLedger {
    invoices_path: PathBuf,
    sales_log: SalesLog,
    tax_rate: TaxRate,
    mirror: Vec<Invoice>,
}

impl InvoiceLedger {
    /// Opens the ledger described by `config`, creating the data directory.
    ///
    /// The invoice file itself is not read here.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::io(data_dir, e))?;

        let ledger = InvoiceLedger {
            invoices_path: config.invoices_path(),
            sales_log: SalesLog::new(config.sales_log_path()),
            tax_rate: config.tax_rate(),
            mirror: Vec::new(),
        };
        info!(path = ?ledger.invoices_path, tax_rate = %ledger.tax_rate, "Invoice ledger opened");
        Ok(ledger)
    }

    pub fn invoices_path(&self) -> &Path {
        &self.invoices_path
    }

    pub fn sales_log(&self) -> &SalesLog {
        &self.sales_log
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Invoices written or rebuilt in this session, oldest first.
    pub fn invoices(&self) -> &[Invoice] {
        &self.mirror
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Next free invoice number: one past the largest id in the file.
    ///
    /// Reads the file every time; a missing file starts numbering at 1.
    pub fn next_invoice_id(&self) -> StoreResult<InvoiceId> {
        let Some(file) = self.open_for_read()? else {
            return Ok(1);
        };
        let max = codec::max_invoice_id(BufReader::new(file))
            .map_err(|e| StoreError::io(&self.invoices_path, e))?;
        Ok(max.map_or(1, |id| id + 1))
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Turns the bill into a durable invoice. This is the single commit point
    /// of a sale.
    ///
    /// The timestamp is truncated to whole seconds so the stored invoice and
    /// the returned one are identical.
    pub fn finalize(&mut self, bill: Bill, now: NaiveDateTime) -> StoreResult<Invoice> {
        if bill.is_empty() {
            return Err(StoreError::EmptyBill);
        }

        let id = self.next_invoice_id()?;
        let invoice = bill.into_invoice(id, now.trunc_subsecs(0), self.tax_rate);

        self.append_block(&invoice)?;
        self.sales_log.append(&SalesEntry::from_invoice(&invoice))?;

        info!(
            invoice_id = invoice.id,
            customer_id = invoice.customer_id,
            items = invoice.items.len(),
            total = %invoice.total,
            "Invoice committed"
        );
        self.mirror.push(invoice.clone());
        Ok(invoice)
    }

    fn append_block(&self, invoice: &Invoice) -> StoreResult<()> {
        let block = codec::encode(invoice);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.invoices_path)
            .map_err(|e| StoreError::io(&self.invoices_path, e))?;

        file.write_all(block.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&self.invoices_path, e))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every readable block in the file, in file order.
    ///
    /// Damaged blocks are logged and left out.
    pub fn records(&self) -> StoreResult<Vec<InvoiceRecord>> {
        let Some(file) = self.open_for_read()? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for scanned in codec::scan(BufReader::new(file)) {
            match scanned.map_err(|e| StoreError::io(&self.invoices_path, e))? {
                Scanned::Invoice(record) => records.push(record),
                Scanned::Skipped { line, reason } => {
                    debug!(line, %reason, "Block left out of listing");
                }
            }
        }
        Ok(records)
    }

    /// Header of every readable invoice, for the invoice listing.
    pub fn summaries(&self) -> StoreResult<Vec<InvoiceHeader>> {
        Ok(self.records()?.into_iter().map(|r| r.header).collect())
    }

    /// Replaces the mirror with every invoice in the file.
    ///
    /// Returns the number of invoices loaded.
    pub fn rebuild<C>(&mut self, catalog: &C) -> StoreResult<usize>
    where
        C: Catalog + ?Sized,
    {
        let invoices: Vec<Invoice> = self
            .records()?
            .iter()
            .map(|record| record.decode(catalog))
            .collect();

        info!(count = invoices.len(), "Invoice mirror rebuilt");
        self.mirror = invoices;
        Ok(self.mirror.len())
    }

    /// Finds an invoice in the mirror, then in the file.
    ///
    /// Only the matching block is decoded.
    pub fn find_by_id<C>(&self, id: InvoiceId, catalog: &C) -> StoreResult<Invoice>
    where
        C: Catalog + ?Sized,
    {
        if let Some(invoice) = self.mirror.iter().find(|inv| inv.id == id) {
            return Ok(invoice.clone());
        }

        let Some(file) = self.open_for_read()? else {
            return Err(StoreError::InvoiceNotFound(id));
        };
        for scanned in codec::scan(BufReader::new(file)) {
            if let Scanned::Invoice(record) =
                scanned.map_err(|e| StoreError::io(&self.invoices_path, e))?
            {
                if record.header.id == id {
                    return Ok(record.decode(catalog));
                }
            }
        }

        warn!(invoice_id = id, "Invoice not found");
        Err(StoreError::InvoiceNotFound(id))
    }

    fn open_for_read(&self) -> StoreResult<Option<File>> {
        match File::open(&self.invoices_path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.invoices_path, e)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
