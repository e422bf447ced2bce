//! # Store Configuration
//!
//! Where the data files live and the billing constants.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MART_DATA_DIR=/srv/mart/data                                       │
//! │     MART_TAX_RATE_BPS=1800                                             │
//! │     MART_LOW_STOCK_THRESHOLD=5                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/mart-pos/mart.toml (Linux)                               │
//! │     ~/Library/Application Support/com.mart.mart-pos/mart.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./data, 18% GST, threshold 5                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # mart.toml
//! [paths]
//! data_dir = "data"
//! invoices = "invoices.txt"
//! sales_log = "sales.csv"
//! products = "products.csv"
//! customers = "customers.csv"
//! offers = "offers.csv"
//! report = "report.txt"
//!
//! [billing]
//! tax_rate_bps = 1800
//! low_stock_threshold = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use mart_core::validation::validate_tax_rate_bps;
use mart_core::{TaxRate, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TAX_RATE_BPS};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Paths
// =============================================================================

/// File locations. File names are relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Append-only invoice records.
    #[serde(default = "default_invoices")]
    pub invoices: String,

    /// One `id,timestamp,customer,total` row per invoice.
    #[serde(default = "default_sales_log")]
    pub sales_log: String,

    #[serde(default = "default_products")]
    pub products: String,

    #[serde(default = "default_customers")]
    pub customers: String,

    #[serde(default = "default_offers")]
    pub offers: String,

    /// Target of `write_report`.
    #[serde(default = "default_report")]
    pub report: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_invoices() -> String {
    "invoices.txt".to_string()
}
fn default_sales_log() -> String {
    "sales.csv".to_string()
}
fn default_products() -> String {
    "products.csv".to_string()
}
fn default_customers() -> String {
    "customers.csv".to_string()
}
fn default_offers() -> String {
    "offers.csv".to_string()
}
fn default_report() -> String {
    "report.txt".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            invoices: default_invoices(),
            sales_log: default_sales_log(),
            products: default_products(),
            customers: default_customers(),
            offers: default_offers(),
            report: default_report(),
        }
    }
}

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// GST on the bill subtotal, in basis points.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Threshold for product rows that do not carry their own.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}
fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: default_tax_rate_bps(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

// =============================================================================
// Store Config
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub billing: BillingConfig,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.paths.data_dir = data_dir.into();
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (mart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents =
                    std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::io(&path, e))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        validate_tax_rate_bps(self.billing.tax_rate_bps)
            .map_err(|e| StoreError::Config(e.to_string()))?;

        if self.billing.low_stock_threshold < 0 {
            return Err(StoreError::Config(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        let files = [
            ("invoices", &self.paths.invoices),
            ("sales_log", &self.paths.sales_log),
            ("products", &self.paths.products),
            ("customers", &self.paths.customers),
            ("offers", &self.paths.offers),
            ("report", &self.paths.report),
        ];
        for (name, file) in files {
            if file.trim().is_empty() {
                return Err(StoreError::Config(format!("paths.{} must not be empty", name)));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("MART_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.paths.data_dir = PathBuf::from(dir);
        }

        if let Some(bps) = var("MART_TAX_RATE_BPS") {
            match bps.parse::<u32>() {
                Ok(parsed) => self.billing.tax_rate_bps = parsed,
                Err(_) => warn!(value = %bps, "Ignoring non-numeric MART_TAX_RATE_BPS"),
            }
        }

        if let Some(threshold) = var("MART_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<i64>() {
                Ok(parsed) => self.billing.low_stock_threshold = parsed,
                Err(_) => warn!(value = %threshold, "Ignoring non-numeric MART_LOW_STOCK_THRESHOLD"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "mart", "mart-pos")
            .map(|dirs| dirs.config_dir().join("mart.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.paths.data_dir
    }

    pub fn invoices_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.invoices)
    }

    pub fn sales_log_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.sales_log)
    }

    pub fn products_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.products)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.customers)
    }

    pub fn offers_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.offers)
    }

    pub fn report_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.report)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.billing.tax_rate_bps)
    }
}
