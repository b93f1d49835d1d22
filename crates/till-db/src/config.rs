//! # Store Configuration
//!
//! Settings read once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TILL_*`)
//! 2. Defaults (this file)
//!
//! ## Environment Variables
//! | Variable               | Default                               |
//! |------------------------|---------------------------------------|
//! | `TILL_DB_PATH`         | `<platform data dir>/till.db`         |
//! | `TILL_STORE_NAME`      | `Till Store`                          |
//! | `TILL_CURRENCY_SYMBOL` | `$`                                   |
//! | `TILL_PENALTY_RATE`    | `0.05` (daily, fraction of the amount)|
//!
//! Read-only after initialization.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use till_core::installment::PENALTY_RATE;
use tracing::warn;

use crate::pool::DbConfig;

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "till.db";

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub database_path: PathBuf,

    /// Store name (shown on backups and reports)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Daily penalty rate for overdue installments.
    pub penalty_rate: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: default_database_path(),
            store_name: "Till Store".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            penalty_rate: PENALTY_RATE,
        }
    }
}

impl StoreConfig {
    /// Creates a StoreConfig from environment variables and defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StoreConfig::default();

        if let Some(path) = lookup("TILL_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(store_name) = lookup("TILL_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(symbol) = lookup("TILL_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(rate_str) = lookup("TILL_PENALTY_RATE") {
            match rate_str.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => config.penalty_rate = rate,
                _ => warn!(value = %rate_str, "Ignoring invalid TILL_PENALTY_RATE"),
            }
        }

        config
    }

    /// Database configuration pointing at [`database_path`](Self::database_path).
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = StoreConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

/// Platform data directory, falling back to the working directory.
///
/// - **macOS**: `~/Library/Application Support/com.till.store/till.db`
/// - **Windows**: `%APPDATA%\till\store\data\till.db`
/// - **Linux**: `~/.local/share/store/till.db`
fn default_database_path() -> PathBuf {
    match ProjectDirs::from("com", "till", "store") {
        Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
        None => PathBuf::from(DATABASE_FILE),
    }
}
