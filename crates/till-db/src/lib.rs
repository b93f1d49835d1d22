//! # till-db: Database Layer for Till
//!
//! Persistence for the Till back office: catalog, customers, credit sales
//! with their installments, the cash register, and JSON backups.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Data Flow                                 │
//! │                                                                         │
//! │  Caller (UI command, seed binary, tests)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │   │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo   │   └──────────────┘  │   │
//! │  │   │               │    │ CreditRepo     │                     │   │
//! │  │   │ StoreConfig   │    │ CashRegister   │   BackupService    │   │
//! │  │   └───────────────┘    └────────────────┘                     │   │
//! │  │                               │                                │   │
//! │  │                               ▼                                │   │
//! │  │                  till-core (amortization, pricing, units)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite Database  (TILL_DB_PATH or <data dir>/till.db)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Store configuration from the environment
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`backup`] - Whole-database JSON export and import
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, StoreConfig};
//!
//! till_db::init_tracing();
//!
//! let config = StoreConfig::from_env();
//! let db = Database::new(config.db_config()).await?;
//!
//! let credit = db.credit_sales().with_penalty_rate(config.penalty_rate);
//! credit.refresh_overdue(today).await?;
//! let summary = db.cash_register().daily_summary(today).await?;
//! ```

use tracing_subscriber::EnvFilter;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use backup::{BackupService, ImportStats, Snapshot, SNAPSHOT_FORMAT_VERSION};
pub use config::StoreConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cash_register::{CashRegisterRepository, DailySummary};
pub use repository::credit::{
    CreditLine, CreditRepository, CreditSaleDetail, NewCreditSale, PaymentReceipt,
};
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: INFO, DEBUG for till crates, WARN for sqlx
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
