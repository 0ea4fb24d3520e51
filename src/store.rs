//! Key-value store abstraction for small pieces of shared state.
//!
//! The service keeps the published client version here. Production uses the
//! SQLite-backed [`Database`](crate::db::Database); [`MemoryStore`] serves
//! tests and embedders that need no persistence.

use crate::error::Result;
use crate::utils::lock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// String key-value store with optional expiry
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// `ttl = None` keeps the value until it is overwritten.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
}

/// Non-persistent [`KeyValueStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Option<DateTime<Utc>>)>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

/// Absolute expiry for a relative `ttl`, saturating far in the future
pub(crate) fn expiry_from(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.map(|ttl| {
        chrono::TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    })
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now();
        let entries = lock(&self.entries);
        Ok(entries
            .get(key)
            .filter(|(_, expires)| expires.is_none_or(|at| at > now))
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires = expiry_from(Utc::now(), ttl);
        lock(&self.entries).insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }
}
