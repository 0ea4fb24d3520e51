//! Key-value rows with optional expiry.

use crate::error::DatabaseError;
use crate::store::{KeyValueStore, expiry_from};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::Database;

impl Database {
    /// Delete rows whose expiry has passed
    ///
    /// Expired rows already read as absent; this only reclaims space.
    /// Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().timestamp_millis();
        let result = sqlx::query("DELETE FROM kv_store WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to purge expired keys: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Utc::now().timestamp_millis();
        sqlx::query_scalar(
            r#"
            SELECT value FROM kv_store
            WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to read key '{}': {}",
                key, e
            )))
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Utc::now();
        let expires_at = expiry_from(now, ttl).map(|at| at.timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, expires_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to write key '{}': {}",
                key, e
            )))
        })?;

        tracing::debug!(key, ttl = ?ttl, "Key stored");
        Ok(())
    }
}
