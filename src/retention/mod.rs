//! The retention store abstraction: a bounded-window cache of ingested
//! events, queryable by predicate. The `RetentionStore` trait lets the
//! relay and transport layers depend on an interface rather than the
//! concrete Mongo driver, the way `catalog`'s storage traits sit in front
//! of its `sqlx` pool.

pub mod mongo;

pub use mongo::MongoStore;

use crate::error::StoreError;
use crate::predicate::Predicate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Field under which the derived ingestion timestamp is stored. Deliberately
/// distinct from any field name the upstream payload might itself use
/// (`timestamp`, `header.gatewayTimestamp`) so storing a record can never
/// silently overwrite a same-named upstream field.
pub const INGESTED_AT_FIELD: &str = "_ingested_at";

#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// Ensures the backing indexes exist. Called once at startup; failure
    /// here is fatal.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Derives the ingestion timestamp and persists the event. Failure here
    /// is logged and drops the event from retention only.
    async fn store_event(&self, event: Value) -> Result<(), StoreError>;

    /// Returns matching events, newest first, with retention-internal
    /// fields stripped.
    async fn query(
        &self,
        predicate: &Predicate,
        after_timestamp: Option<DateTime<Utc>>,
        max_items: Option<i64>,
    ) -> Result<Vec<Value>, StoreError>;
}

/// Derives the ingestion timestamp for a newly-ingested event: the payload's
/// own `message.timestamp` if present, else `header.gatewayTimestamp`;
/// absent both, the event cannot be retained.
pub fn derive_ingestion_timestamp(event: &Value) -> Result<DateTime<Utc>, StoreError> {
    let candidate = event
        .pointer("/message/timestamp")
        .and_then(Value::as_str)
        .or_else(|| event.pointer("/header/gatewayTimestamp").and_then(Value::as_str))
        .ok_or(StoreError::MissingTimestamp)?;

    crate::timeutil::parse_utc(candidate).map_err(|_| StoreError::MissingTimestamp)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_payload_timestamp() {
        let event = json!({
            "header": {"gatewayTimestamp": "2025-01-01T00:00:00Z"},
            "message": {"timestamp": "2025-06-06T17:30:00Z"},
        });
        let ts = derive_ingestion_timestamp(&event).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-06T17:30:00+00:00");
    }

    #[test]
    fn test_falls_back_to_gateway_timestamp() {
        let event = json!({"header": {"gatewayTimestamp": "2025-01-01T00:00:00Z"}});
        let ts = derive_ingestion_timestamp(&event).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_neither_present_is_error() {
        let event = json!({"message": {"event": "Scan"}});
        assert!(matches!(
            derive_ingestion_timestamp(&event),
            Err(StoreError::MissingTimestamp)
        ));
    }

    #[test]
    fn test_naive_payload_timestamp_is_utc() {
        let event = json!({"message": {"timestamp": "2025-06-06T17:30:00"}});
        let ts = derive_ingestion_timestamp(&event).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-06T17:30:00+00:00");
    }
}
