//! Persistent key-value store adapter
//!
//! Documents are JSON strings addressed by key. `TypedStore` adds the
//! serde layer; reads never write, so a missing document reads as its
//! default until the first locked update stores it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::warn;
use vaidya_common::Result;

/// Raw get/set over a persistent store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// `kv_store` table backed store
#[derive(Clone)]
pub struct SqliteKvStore {
    db: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed JSON view over a [`KeyValueStore`]
#[derive(Clone)]
pub struct TypedStore {
    inner: Arc<dyn KeyValueStore>,
}

impl TypedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Read `key`, falling back to `fallback` when absent or undecodable
    ///
    /// Never writes: a missing document is only created by the next `set`,
    /// which callers issue under their own write lock.
    pub async fn get_or<T>(&self, key: &str, fallback: T) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored document unreadable, using fallback value");
                    Ok(fallback)
                }
            },
            None => Ok(fallback),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.inner.set(key, raw).await
    }
}

/// Memory store whose first `get` stalls, widening read/write races in tests
#[cfg(test)]
pub(crate) struct StalledFirstReadStore {
    inner: MemoryKvStore,
    stall: std::time::Duration,
    stalled: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl StalledFirstReadStore {
    pub(crate) fn new(stall: std::time::Duration) -> Self {
        Self {
            inner: MemoryKvStore::new(),
            stall,
            stalled: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for StalledFirstReadStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.inner.get(key).await?;
        if !self.stalled.swap(true, std::sync::atomic::Ordering::SeqCst) {
            tokio::time::sleep(self.stall).await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.inner.set(key, value).await
    }
}
