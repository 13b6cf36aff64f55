//! Persisted chat turns per page URL.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use pagemind_protocols::{
    ChatRole, ChatTurn, KeyValueStore, StoreError, StoredRecord, StoredValue, ttl_cutoff_millis,
};

#[derive(Debug, Serialize, Deserialize)]
struct TurnContent {
    role: ChatRole,
    text: String,
}

/// Chat transcript storage keyed by `chat:<url>`.
pub struct ChatHistory {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
        }
    }

    pub fn key(url: &str) -> String {
        format!("chat:{}", url)
    }

    /// Append one turn to the transcript of `url`.
    pub async fn append(&self, url: &str, role: ChatRole, text: &str) -> Result<(), StoreError> {
        let content = serde_json::to_value(TurnContent {
            role,
            text: text.to_string(),
        })?;
        self.store
            .append(&Self::key(url), StoredRecord::now(content))
            .await
    }

    /// Turns for `url` that are younger than the TTL, oldest first.
    pub async fn load(&self, url: &str) -> Result<Vec<ChatTurn>, StoreError> {
        let cutoff = ttl_cutoff_millis(Utc::now(), self.ttl);
        let records = match self.store.get(&Self::key(url)).await? {
            Some(StoredValue::List(records)) => records,
            _ => return Ok(Vec::new()),
        };

        Ok(records
            .into_iter()
            .filter(|record| !record.is_expired(cutoff))
            .filter_map(|record| {
                let content: TurnContent = serde_json::from_value(record.content).ok()?;
                Some(ChatTurn {
                    role: content.role,
                    text: content.text,
                    timestamp: record.timestamp,
                })
            })
            .collect())
    }

    pub async fn clear(&self, url: &str) -> Result<(), StoreError> {
        self.store.remove(&Self::key(url)).await
    }
}
