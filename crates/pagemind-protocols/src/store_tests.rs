use super::*;
use chrono::Duration as ChronoDuration;
use serde_json::json;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[test]
fn test_record_expiry() {
    let now = Utc::now();
    let cutoff = ttl_cutoff_millis(now, DAY);

    let old = StoredRecord::new(json!("old"), now - ChronoDuration::hours(25));
    let fresh = StoredRecord::new(json!("fresh"), now - ChronoDuration::hours(1));

    assert!(old.is_expired(cutoff));
    assert!(!fresh.is_expired(cutoff));
}

#[test]
fn test_prune_record() {
    let now = Utc::now();
    let cutoff = ttl_cutoff_millis(now, DAY);

    let mut old = StoredValue::Record(StoredRecord::new(json!(1), now - ChronoDuration::hours(25)));
    assert_eq!(old.prune_expired(cutoff), (false, 0));

    let mut fresh = StoredValue::Record(StoredRecord::new(json!(1), now));
    assert_eq!(fresh.prune_expired(cutoff), (true, 0));
}

#[test]
fn test_prune_list_keeps_fresh_elements() {
    let now = Utc::now();
    let cutoff = ttl_cutoff_millis(now, DAY);

    let mut value = StoredValue::List(vec![
        StoredRecord::new(json!("a"), now - ChronoDuration::hours(30)),
        StoredRecord::new(json!("b"), now - ChronoDuration::hours(2)),
        StoredRecord::new(json!("c"), now - ChronoDuration::hours(26)),
    ]);

    assert_eq!(value.prune_expired(cutoff), (true, 2));
    match value {
        StoredValue::List(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].content, json!("b"));
        }
        StoredValue::Record(_) => panic!("list became a record"),
    }
}

#[test]
fn test_prune_list_fully_expired() {
    let now = Utc::now();
    let cutoff = ttl_cutoff_millis(now, DAY);

    let mut value = StoredValue::List(vec![StoredRecord::new(
        json!("a"),
        now - ChronoDuration::hours(48),
    )]);
    assert_eq!(value.prune_expired(cutoff), (false, 1));
}

#[test]
fn test_untagged_serialization() {
    let record = StoredValue::Record(StoredRecord {
        content: json!({"text": "hi"}),
        timestamp: 42,
    });
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["timestamp"], 42);
    assert_eq!(json["content"]["text"], "hi");

    let list: StoredValue = serde_json::from_value(json!([
        {"content": "x", "timestamp": 1},
        {"content": "y", "timestamp": 2}
    ]))
    .unwrap();
    assert!(matches!(list, StoredValue::List(ref items) if items.len() == 2));
}

#[test]
fn test_sweep_report_empty() {
    assert!(SweepReport::default().is_empty());
    let report = SweepReport {
        removed_keys: 1,
        pruned_elements: 0,
    };
    assert!(!report.is_empty());
}
