//! Key-value stores with TTL sweeping.

mod file;
mod memory;
mod sweeper;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sweeper::StoreSweeper;

use std::collections::BTreeMap;

use tracing::debug;

use pagemind_protocols::{StoredRecord, StoredValue, SweepReport};

/// Push `record` onto the array at `key`.
pub(crate) fn append_entry(
    entries: &mut BTreeMap<String, StoredValue>,
    key: &str,
    record: StoredRecord,
) {
    match entries.get_mut(key) {
        Some(StoredValue::List(items)) => items.push(record),
        Some(value) => {
            debug!("Replacing single record at {} with a list", key);
            *value = StoredValue::List(vec![record]);
        }
        None => {
            entries.insert(key.to_string(), StoredValue::List(vec![record]));
        }
    }
}

/// Expire records and array elements older than `cutoff_millis` in place.
pub(crate) fn sweep_entries(
    entries: &mut BTreeMap<String, StoredValue>,
    cutoff_millis: i64,
) -> SweepReport {
    let mut report = SweepReport::default();
    entries.retain(|key, value| {
        let (keep, pruned) = value.prune_expired(cutoff_millis);
        if keep {
            report.pruned_elements += pruned;
        } else {
            debug!("Sweeping expired key {}", key);
            report.removed_keys += 1;
        }
        keep
    });
    report
}
