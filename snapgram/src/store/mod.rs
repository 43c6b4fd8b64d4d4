//! Document-store boundary.
//!
//! This module provides:
//! - `DocumentStore` - the five calls the client and resolver make against a backend
//! - `MemoryStore` - in-process store with failure injection, used by tests and demos
//! - `RedisStore` - one Redis hash per collection over a `ConnectionManager`
//! - `list_all` - follows cursors until a listing is exhausted

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use serde_json::{Map, Value};

use crate::{
    errors::StoreError,
    query::{MAX_LIMIT, Query},
    types::{Document, DocumentList},
};

/// Backend document database.
///
/// Every call is a single round trip; there is no retry or timeout at this layer.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetches one document, or [`StoreError::NotFound`].
    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Document, StoreError>;

    /// Lists documents matching `queries`, see [`crate::query`].
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList, StoreError>;

    /// Creates a document. Fails with [`StoreError::Conflict`] if the id is taken.
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Shallow-merges `data` into an existing document.
    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError>;
}

/// Lists every document matching `queries`, paging with `cursor_after`.
///
/// `queries` must not carry its own limit, offset or cursor.
pub async fn list_all<S: DocumentStore>(
    store: &S,
    collection: &str,
    queries: &[Query],
) -> Result<Vec<Document>, StoreError> {
    let mut documents = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let mut page_queries = queries.to_vec();
        page_queries.push(Query::limit(MAX_LIMIT));
        if let Some(cursor) = &cursor {
            page_queries.push(Query::cursor_after(cursor.clone()));
        }

        let page = store.list_documents(collection, &page_queries).await?;
        let full = page.documents.len() as u64 >= MAX_LIMIT;
        cursor = page.documents.last().map(|doc| doc.id.clone());
        documents.extend(page.documents);

        if !full || cursor.is_none() {
            return Ok(documents);
        }
    }
}
