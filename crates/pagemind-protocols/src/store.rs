//! Key-value store protocol definitions.
//!
//! Values carry UTC millisecond timestamps, either on the whole record or on
//! each element of an array, so a periodic sweep can expire them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Core trait for persistent key-value stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Append `record` to the array at `key` in one step.
    ///
    /// A missing key starts a new array; a single record is replaced.
    async fn append(&self, key: &str, record: StoredRecord) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// List all keys.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Remove records older than `ttl` relative to `now`.
    async fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> Result<SweepReport, StoreError>;
}

/// A timestamped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub content: serde_json::Value,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl StoredRecord {
    pub fn new(content: serde_json::Value, at: DateTime<Utc>) -> Self {
        Self {
            content,
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn now(content: serde_json::Value) -> Self {
        Self::new(content, Utc::now())
    }

    pub fn is_expired(&self, cutoff_millis: i64) -> bool {
        self.timestamp < cutoff_millis
    }
}

/// A stored value: one record or an array of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Record(StoredRecord),
    List(Vec<StoredRecord>),
}

impl StoredValue {
    /// Drop expired parts of the value.
    ///
    /// Returns `(keep, pruned)`: whether the key should stay and how many
    /// array elements were removed. A list with no remaining elements is
    /// not kept.
    pub fn prune_expired(&mut self, cutoff_millis: i64) -> (bool, usize) {
        match self {
            StoredValue::Record(record) => (!record.is_expired(cutoff_millis), 0),
            StoredValue::List(items) => {
                let before = items.len();
                items.retain(|item| !item.is_expired(cutoff_millis));
                let pruned = before - items.len();
                (!items.is_empty(), pruned)
            }
        }
    }
}

/// Cutoff in epoch milliseconds for a sweep.
pub fn ttl_cutoff_millis(now: DateTime<Utc>, ttl: Duration) -> i64 {
    let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now.timestamp_millis().saturating_sub(ttl_millis)
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Keys deleted entirely.
    pub removed_keys: usize,
    /// Array elements removed from keys that were kept.
    pub pruned_elements: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.removed_keys == 0 && self.pruned_elements == 0
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
