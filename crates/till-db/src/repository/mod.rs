//! # Repository Module
//!
//! Database repository implementations for Till.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.credit_sales().pay_installment(id, PaymentMethod::Cash)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CreditRepository ── opens one transaction ───────────────────┐        │
//! │       │                                                       │        │
//! │       │  connection-level helpers, shared across repos:       │        │
//! │       │  ├── credit::mark_paid                                │        │
//! │       │  ├── cash_register::insert_movement                   │  tx    │
//! │       │  └── customer::recompute_pending_balance              │        │
//! │       │                                                       │        │
//! │       ▼                                                       │        │
//! │  commit ◄─────────────────────────────────────────────────────┘        │
//! │                                                                         │
//! │  Public methods take `&self` and use the pool; the `pub(crate)`        │
//! │  helpers take `&mut SqliteConnection` so they run inside any tx.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and balances
//! - [`CreditRepository`](credit::CreditRepository) - Credit sales and installments
//! - [`CashRegisterRepository`](cash_register::CashRegisterRepository) - Daily cash

pub mod cash_register;
pub mod credit;
pub mod customer;
pub mod product;
