use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

use super::DocumentStore;
use crate::{
    errors::StoreError,
    query::{Query, QueryPlan},
    types::{Document, DocumentList},
};

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Document>>,
    clock: Option<DateTime<Utc>>,
    failing_gets: HashSet<(String, String)>,
    failing_collections: HashSet<String>,
}

impl MemoryState {
    /// Current time, nudged forward so that timestamps never repeat.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing_collections.contains(collection) {
            return Err(StoreError::Transient {
                message: format!("collection '{collection}' is unavailable"),
            });
        }
        Ok(())
    }

    fn find_mut(&mut self, collection: &str, document_id: &str) -> Option<&mut Document> {
        self.collections
            .get_mut(collection)?
            .iter_mut()
            .find(|doc| doc.id == document_id)
    }
}

/// In-process document store.
///
/// Documents keep insertion order per collection. Failures can be injected per
/// document (`fail_get`) or per collection (`fail_collection`); injected failures
/// surface as [`StoreError::Transient`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a document verbatim, keeping its timestamps.
    pub fn seed(&self, document: Document) {
        let mut state = self.lock();
        if state.clock.is_none_or(|clock| clock < document.updated_at) {
            state.clock = Some(document.updated_at);
        }
        let documents = state.collections.entry(document.collection_id.clone()).or_default();
        match documents.iter_mut().find(|doc| doc.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }

    /// Makes every later `get_document` of this document fail.
    pub fn fail_get(&self, collection: &str, document_id: &str) {
        self.lock()
            .failing_gets
            .insert((collection.to_string(), document_id.to_string()));
    }

    /// Makes every later call against this collection fail.
    pub fn fail_collection(&self, collection: &str) {
        self.lock().failing_collections.insert(collection.to_string());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_gets.clear();
        state.failing_collections.clear();
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Document, StoreError> {
        let state = self.lock();
        state.check_available(collection)?;
        if state
            .failing_gets
            .contains(&(collection.to_string(), document_id.to_string()))
        {
            return Err(StoreError::Transient {
                message: format!("injected failure reading '{document_id}' from '{collection}'"),
            });
        }
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == document_id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, document_id))
    }

    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList, StoreError> {
        let plan = QueryPlan::from_queries(queries)?;
        let documents = {
            let state = self.lock();
            state.check_available(collection)?;
            state.collections.get(collection).cloned().unwrap_or_default()
        };
        plan.execute(documents)
    }

    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut state = self.lock();
        state.check_available(collection)?;
        if state.find_mut(collection, document_id).is_some() {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                document_id: document_id.to_string(),
            });
        }
        let now = state.tick();
        let mut document = Document::new(collection, document_id, data);
        document.created_at = now;
        document.updated_at = now;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut state = self.lock();
        state.check_available(collection)?;
        let now = state.tick();
        let document = state
            .find_mut(collection, document_id)
            .ok_or_else(|| StoreError::not_found(collection, document_id))?;
        document.merge(data);
        document.updated_at = now;
        Ok(document.clone())
    }

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_available(collection)?;
        let documents = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, document_id))?;
        let before = documents.len();
        documents.retain(|doc| doc.id != document_id);
        if documents.len() == before {
            return Err(StoreError::not_found(collection, document_id));
        }
        Ok(())
    }
}
