//! In-memory key-value store.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use pagemind_protocols::{
    KeyValueStore, StoreError, StoredRecord, StoredValue, SweepReport, ttl_cutoff_millis,
};

use super::{append_entry, sweep_entries};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn append(&self, key: &str, record: StoredRecord) -> Result<(), StoreError> {
        append_entry(&mut *self.entries.write().await, key, record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> Result<SweepReport, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(sweep_entries(&mut entries, ttl_cutoff_millis(now, ttl)))
    }
}
