//! # Store Error Types
//!
//! Error types for everything that touches the data directory.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / toml / CoreError                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the file path and categorization      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mart-report / till UI ← prints the message                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use mart_core::{CoreError, InvoiceId};
use thiserror::Error;

/// Storage, checkout and configuration errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Checkout was attempted with nothing on the bill.
    #[error("Cannot finalize an empty bill")]
    EmptyBill,

    /// No invoice with this id in memory or in the invoice file.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Reading or writing a data file failed.
    ///
    /// ## When This Occurs
    /// - Data directory not writable
    /// - Disk full during an invoice append
    /// - File removed while the till is running
    ///
    /// During checkout this is fatal for the invoice being written: stock
    /// has already been reserved and is NOT rolled back.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A flat-file row that cannot be used.
    #[error("{file} line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// mart.toml could not be parsed.
    #[error("Failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Billing rule violation bubbling up from mart-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Wraps an I/O error with the file it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a Parse error for a flat-file row.
    pub fn parse(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        StoreError::Parse {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    /// True for failures that happened after the invoice was durably written.
    ///
    /// The sale is recorded; only the follow-up saves need reconciling.
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
