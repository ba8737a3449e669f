//! S4 (retention query ordering) exercised against an in-memory
//! `RetentionStore`, standing in for the MongoDB-backed implementation the
//! same trait is built against (`src/retention/mongo.rs`). This establishes
//! the contract every implementation must honor: newest-first ordering,
//! `after_timestamp` exclusion, and `max_items` truncation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eddn_relay::error::StoreError;
use eddn_relay::predicate::Predicate;
use eddn_relay::retention::{derive_ingestion_timestamp, RetentionStore};
use serde_json::{json, Value};
use std::sync::Mutex;

struct InMemoryStore {
    records: Mutex<Vec<(DateTime<Utc>, Value)>>,
}

impl InMemoryStore {
    fn new() -> Self {
        InMemoryStore {
            records: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RetentionStore for InMemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn store_event(&self, event: Value) -> Result<(), StoreError> {
        let ingested_at = derive_ingestion_timestamp(&event)?;
        self.records.lock().unwrap().push((ingested_at, event));
        Ok(())
    }

    async fn query(
        &self,
        predicate: &Predicate,
        after_timestamp: Option<DateTime<Utc>>,
        max_items: Option<i64>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut matches: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(ts, event)| {
                let after_cutoff = match after_timestamp {
                    Some(after) => *ts > after,
                    None => true,
                };
                after_cutoff && predicate.matches(event)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.0.cmp(&a.0));
        if let Some(max_items) = max_items {
            matches.truncate(max_items as usize);
        }
        Ok(matches.into_iter().map(|(_, event)| event).collect())
    }
}

#[tokio::test]
async fn s4_query_returns_newest_first_after_cutoff() {
    let store = InMemoryStore::new();

    let t = json!({"message": {"timestamp": "2025-06-06T12:00:00Z"}, "n": "t0"});
    let t_plus_1h = json!({"message": {"timestamp": "2025-06-06T13:00:00Z"}, "n": "t1"});
    let t_plus_2h = json!({"message": {"timestamp": "2025-06-06T14:00:00Z"}, "n": "t2"});

    store.store_event(t).await.unwrap();
    store.store_event(t_plus_1h).await.unwrap();
    store.store_event(t_plus_2h).await.unwrap();

    let after = eddn_relay::timeutil::parse_utc("2025-06-06T12:30:00Z").unwrap();
    let predicate = Predicate::match_all();

    let results = store
        .query(&predicate, Some(after), Some(10))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["n"], "t2");
    assert_eq!(results[1]["n"], "t1");
}

#[tokio::test]
async fn store_event_rejects_event_without_timestamp() {
    let store = InMemoryStore::new();
    let err = store
        .store_event(json!({"message": {"event": "Scan"}}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingTimestamp));
}
