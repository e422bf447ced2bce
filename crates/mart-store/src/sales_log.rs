//! # Sales Log
//!
//! Compact append-only CSV with one row per invoice:
//!
//! ```text
//! invoice_id,timestamp,customer_id,total
//! 12,2025-01-02 09:00:00,4,70.80
//! ```
//!
//! There is no header row. The reports read this file instead of decoding
//! every invoice block.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mart_core::{CustomerId, Invoice, InvoiceId, Money, TIMESTAMP_FORMAT};

use crate::error::{StoreError, StoreResult};

/// One sales-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub invoice_id: InvoiceId,
    pub timestamp: NaiveDateTime,
    pub customer_id: CustomerId,
    pub total: Money,
}

impl SalesEntry {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        SalesEntry {
            invoice_id: invoice.id,
            timestamp: invoice.timestamp,
            customer_id: invoice.customer_id,
            total: invoice.total,
        }
    }

    /// The row as written, without line break.
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.invoice_id,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.customer_id,
            self.total
        )
    }

    /// Parses one row.
    pub fn parse_row(text: &str) -> Result<Self, String> {
        let fields: Vec<&str> = text.trim_end_matches(['\r', '\n']).split(',').collect();
        let [invoice_id, timestamp, customer_id, total] = fields.as_slice() else {
            return Err(format!("expected 4 fields, found {}", fields.len()));
        };

        Ok(SalesEntry {
            invoice_id: invoice_id
                .trim()
                .parse()
                .map_err(|_| format!("bad invoice id '{}'", invoice_id))?,
            timestamp: NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| format!("bad timestamp '{}': {}", timestamp, e))?,
            customer_id: customer_id
                .trim()
                .parse()
                .map_err(|_| format!("bad customer id '{}'", customer_id))?,
            total: total.parse().map_err(|e| format!("total {}", e))?,
        })
    }
}

/// Handle on the sales-log file.
#[derive(Debug, Clone)]
pub struct SalesLog {
    path: PathBuf,
}

impl SalesLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SalesLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it to disk.
    pub fn append(&self, entry: &SalesEntry) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;

        let row = format!("{}\n", entry.to_row());
        file.write_all(row.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&self.path, e))?;

        debug!(invoice_id = entry.invoice_id, "Sales log row appended");
        Ok(())
    }

    /// Every readable row. A missing file means no sales yet.
    pub fn entries(&self) -> StoreResult<Vec<SalesEntry>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let mut entries = Vec::new();
        for (index, line) in String::from_utf8_lossy(&bytes).lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match SalesEntry::parse_row(line) {
                Ok(entry) => entries.push(entry),
                Err(reason) => warn!(line = index + 1, %reason, "Skipping malformed sales row"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(id: InvoiceId, cents: i64) -> SalesEntry {
        SalesEntry {
            invoice_id: id,
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            customer_id: 4,
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_row_layout() {
        assert_eq!(entry(12, 7080).to_row(), "12,2025-01-02 09:00:00,4,70.80");
    }

    #[test]
    fn test_parse_row_rejects_bad_rows() {
        assert!(SalesEntry::parse_row("12,2025-01-02 09:00:00,4").is_err());
        assert!(SalesEntry::parse_row("12,yesterday,4,70.80").is_err());
        assert!(SalesEntry::parse_row("x,2025-01-02 09:00:00,4,70.80").is_err());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = SalesLog::new(dir.path().join("sales.csv"));

        assert!(log.entries().unwrap().is_empty());

        log.append(&entry(1, 1180)).unwrap();
        log.append(&entry(2, 2360)).unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries, vec![entry(1, 1180), entry(2, 2360)]);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            "1,2025-01-02 09:00:00,4,11.80\nnot a row\n\n2,2025-01-02 09:00:00,0,5.00\n",
        )
        .unwrap();

        let entries = SalesLog::new(path).entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].customer_id, 0);
    }

    #[test]
    fn test_non_utf8_row_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            b"1,2025-01-02 09:00:00,4,11.80\n2,2025-01-02 \xff9:00:00,0,5.00\n3,2025-01-02 10:00:00,0,7.00\n",
        )
        .unwrap();

        let ids: Vec<InvoiceId> = SalesLog::new(path)
            .entries()
            .unwrap()
            .iter()
            .map(|e| e.invoice_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
