//! Repository implementations
//!
//! Repositories hold the SQL and map between database rows and domain types.
//! Queries are built at runtime and rows decoded through `sqlx::FromRow`.

pub mod ledger;

pub use ledger::{PgLedgerStore, PgLedgerTx};
