use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde_json::{Map, Value};

use super::DocumentStore;
use crate::{
    errors::StoreError,
    keys::KeyContext,
    query::{Query, QueryPlan},
    types::{Document, DocumentList},
};

/// Redis-backed document store.
///
/// Each collection is one hash at `{prefix}:{database}:{collection}` mapping
/// document ids to the JSON-encoded document. Listing loads the whole hash and
/// evaluates queries in process.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
    database: String,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            database: database.into(),
        }
    }

    /// Opens a managed connection to `url`.
    pub async fn connect(
        url: &str,
        prefix: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix, database))
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix, &self.database)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Deletes every key under this store's prefix. Returns the number removed.
    pub async fn purge(&self) -> Result<u64, StoreError> {
        const SCAN_COUNT: usize = 1000;
        let pattern = self.keys().prefix_pattern();
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut total_deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                total_deleted += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        log::debug!("purged {total_deleted} keys matching {pattern}");
        Ok(total_deleted)
    }

    async fn write(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        let key = self.keys().collection(collection);
        let encoded = serde_json::to_string(document)?;
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, &document.id, encoded).await?;
        Ok(())
    }
}

impl DocumentStore for RedisStore {
    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Document, StoreError> {
        let key = self.keys().collection(collection);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(key, document_id).await?;
        let raw = raw.ok_or_else(|| StoreError::not_found(collection, document_id))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList, StoreError> {
        let plan = QueryPlan::from_queries(queries)?;
        let key = self.keys().collection(collection);
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.hvals(key).await?;
        let documents = raw
            .iter()
            .map(|encoded| serde_json::from_str::<Document>(encoded))
            .collect::<Result<Vec<_>, _>>()?;
        plan.execute(documents)
    }

    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let key = self.keys().collection(collection);
        let document = Document::new(collection, document_id, data);
        let encoded = serde_json::to_string(&document)?;
        let mut conn = self.conn.clone();
        let inserted: bool = conn.hset_nx(key, document_id, encoded).await?;
        if !inserted {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                document_id: document_id.to_string(),
            });
        }
        Ok(document)
    }

    // Read-merge-write: concurrent updates of the same document race.
    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut document = self.get_document(collection, document_id).await?;
        document.merge(data);
        document.updated_at = Utc::now().max(document.updated_at);
        self.write(collection, &document).await?;
        Ok(document)
    }

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        let key = self.keys().collection(collection);
        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(key, document_id).await?;
        if removed == 0 {
            return Err(StoreError::not_found(collection, document_id));
        }
        Ok(())
    }
}
