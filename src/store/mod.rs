//! String key-value storage for counters, the auth token and settings.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::RwLock;

use crate::db::Database;
use crate::error::StoreError;

pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Persistent string store.
///
/// Single writer is assumed. Individual calls are atomic, a read followed by
/// a write is not.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drops every key. Used on logout.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store backed by the `settings` table of the local SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_database(Database::new(db_path)?))
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        SqliteStore {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Direct access for the parts of the app that need more than get/set.
    pub fn database(&self) -> Result<MutexGuard<'_, Database>, StoreError> {
        self.db
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let db = self.database()?;
        Ok(db.get_setting(key)?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let db = self.database()?;
        Ok(db.set_setting(key, value)?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let db = self.database()?;
        Ok(db.remove_setting(key)?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let db = self.database()?;
        db.clear_settings()?;
        db.clear_number_log()?;
        Ok(())
    }
}

/// In-process store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sqlite_store_clear_drops_all_keys() {
        let store = SqliteStore::in_memory().unwrap();
        store.set(AUTH_TOKEN_KEY, "token").await.unwrap();
        store.set("last_sell_number", "SEL-010").await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get("last_sell_number").await.unwrap(), None);
    }
}
