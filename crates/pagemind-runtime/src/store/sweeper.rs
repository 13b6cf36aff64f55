//! Periodic TTL sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{info, warn};

use pagemind_config::StoreConfig;
use pagemind_protocols::{KeyValueStore, StoreError, SweepReport};

const HOUR: u64 = 60 * 60;

/// Runs [`KeyValueStore::sweep`] on a fixed interval.
pub struct StoreSweeper {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    interval: Duration,
}

impl StoreSweeper {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            store,
            ttl,
            interval: sweep_interval,
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self::new(
            store,
            Duration::from_secs(config.ttl_hours * HOUR),
            Duration::from_secs(config.sweep_interval_hours * HOUR),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sweep once against the current time.
    pub async fn sweep_once(&self) -> Result<SweepReport, StoreError> {
        self.store.sweep(Utc::now(), self.ttl).await
    }

    /// Start the sweep task. The first sweep runs immediately.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);

            loop {
                ticker.tick().await;

                match self.sweep_once().await {
                    Ok(report) if !report.is_empty() => {
                        info!(
                            "Swept store: {} keys removed, {} elements pruned",
                            report.removed_keys, report.pruned_elements
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Store sweep error: {}", e);
                    }
                }
            }
        })
    }
}
