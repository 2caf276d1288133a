//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the hotel ledger using SQLx.
//!
//! # Architecture
//!
//! [`PgLedgerStore`] implements the billing crate's `LedgerStore` port. Each
//! unit of work is a database transaction whose `lock_*` reads take row
//! locks, so reconciliations of one folio are serialized by PostgreSQL.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/hotel")).await?;
//! run_migrations(&pool).await?;
//! let store = Arc::new(PgLedgerStore::new(pool));
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{PgLedgerStore, PgLedgerTx};
