//! MongoDB-backed `RetentionStore`, mirroring the shape of the teacher's
//! `sqlx`-backed `PgPool` held in `Arc`-shared application state
//! (`oidc-discovery-server::AppState`), but using the `mongodb`/`bson`
//! crates — pulled in from `other_examples/manifests/startreedata-vector`'s
//! precedent, since the teacher itself is Postgres-backed.

use super::{derive_ingestion_timestamp, RetentionStore, INGESTED_AT_FIELD};
use crate::error::StoreError;
use crate::predicate::{query, Predicate};
use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde_json::Value;
use std::time::Duration;

const COLLECTION: &str = "events";

pub struct MongoStore {
    collection: Collection<Document>,
    ttl: Duration,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str, ttl: Duration) -> MongoStore {
        MongoStore {
            collection: client.database(database).collection(COLLECTION),
            ttl,
        }
    }
}

#[async_trait]
impl RetentionStore for MongoStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        let ttl_index = IndexModel::builder()
            .keys(doc! { INGESTED_AT_FIELD: 1 })
            .options(IndexOptions::builder().expire_after(self.ttl).build())
            .build();
        let recency_index = IndexModel::builder()
            .keys(doc! { INGESTED_AT_FIELD: -1 })
            .build();

        self.collection
            .create_indexes([ttl_index, recency_index], None)
            .await?;
        Ok(())
    }

    async fn store_event(&self, event: Value) -> Result<(), StoreError> {
        let ingested_at = derive_ingestion_timestamp(&event)?;

        let mut document = bson::to_document(&event)?;
        document.insert(INGESTED_AT_FIELD, bson::DateTime::from_chrono(ingested_at));

        self.collection.insert_one(document, None).await?;
        Ok(())
    }

    async fn query(
        &self,
        predicate: &Predicate,
        after_timestamp: Option<DateTime<Utc>>,
        max_items: Option<i64>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut filter = query::to_query(predicate);
        if let Some(after) = after_timestamp {
            filter.insert(
                INGESTED_AT_FIELD,
                doc! { "$gt": bson::DateTime::from_chrono(after) },
            );
        }

        let mut options = mongodb::options::FindOptions::builder()
            .sort(doc! { INGESTED_AT_FIELD: -1 })
            .build();
        if let Some(max_items) = max_items {
            options.limit = Some(max_items);
        }

        let mut cursor = self.collection.find(filter, options).await?;
        let mut results = Vec::new();
        while let Some(mut document) = cursor.try_next().await? {
            document.remove("_id");
            document.remove(INGESTED_AT_FIELD);
            let value: Value = bson::from_document(document)?;
            results.push(value);
        }
        Ok(results)
    }
}

