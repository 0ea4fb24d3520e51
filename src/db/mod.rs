//! Database layer for taskfeed
//!
//! SQLite persistence for the key-value store.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by concern:
//! - `migrations` - Database lifecycle, schema migrations
//! - `kv` - [`KeyValueStore`](crate::store::KeyValueStore) implementation

use sqlx::sqlite::SqlitePool;

mod kv;
mod migrations;

/// Database handle for taskfeed
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}
