//! Client module: the UI-facing query and mutation wrappers.
//!
//! This module provides:
//! - `Client` - entry point owning a [`DocumentStore`] and the collection names
//! - post, save, user and comment operations, one file per area
//!
//! # Example
//! ```ignore
//! let config = SnapgramConfig::default();
//! let client = Client::connect(&config).await?;
//!
//! let feed = client.get_infinite_posts(None).await?;
//! let saved = client.get_saved_posts(&user_id).await?;
//! ```

mod comments;
mod posts;
mod saves;
mod users;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{
    config::{Collections, FeedSettings, SnapgramConfig},
    errors::StoreError,
    id::{is_valid_id, unique_id},
    models::MutationPayload,
    resolver::{DiagnosticSink, ResolutionIssue, Resolver},
    store::{DocumentStore, RedisStore},
};

/// Main client for social operations against a document store.
pub struct Client<S> {
    store: S,
    collections: Collections,
    feed: FeedSettings,
    diagnostics: Option<DiagnosticSink>,
}

impl<S: DocumentStore> Client<S> {
    /// Create a client with default collection names and feed sizes.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &SnapgramConfig::default())
    }

    pub fn with_config(store: S, config: &SnapgramConfig) -> Self {
        Self {
            store,
            collections: config.collections.clone(),
            feed: config.feed.clone(),
            diagnostics: None,
        }
    }

    /// Publish every swallowed resolution failure on `sink`.
    pub fn with_diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Installs a fresh diagnostic channel and returns its receiving half.
    pub fn diagnostics_channel(&mut self) -> UnboundedReceiver<ResolutionIssue> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.diagnostics = Some(tx);
        rx
    }

    pub fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(&self.store, &self.collections).with_diagnostics(self.diagnostics.as_ref())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn feed(&self) -> &FeedSettings {
        &self.feed
    }

    /// Validates `payload` and creates it under a fresh id.
    async fn insert<P: MutationPayload>(&self, collection: &str, payload: P) -> Result<P::Entity, StoreError> {
        let data = payload.into_payload()?;
        self.create(collection, data).await
    }

    async fn create<T: DeserializeOwned>(&self, collection: &str, data: Map<String, Value>) -> Result<T, StoreError> {
        let document_id = unique_id();
        let document = self.store.create_document(collection, &document_id, data).await?;
        log::debug!("created {collection}/{document_id}");
        document.decode()
    }

    async fn patch<P: MutationPayload>(
        &self,
        collection: &str,
        document_id: &str,
        payload: P,
    ) -> Result<P::Entity, StoreError> {
        require_id("document id", document_id)?;
        let data = payload.into_payload()?;
        self.store
            .update_document(collection, document_id, data)
            .await?
            .decode()
    }
}

impl Client<RedisStore> {
    /// Create a client backed by the Redis server named in `config`.
    pub async fn connect(config: &SnapgramConfig) -> Result<Self, StoreError> {
        let url = config.backend.resolved_url()?;
        let store = RedisStore::connect(&url, &config.backend.prefix, &config.backend.database_id).await?;
        Ok(Self::with_config(store, config))
    }
}

fn require_id(what: &str, id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidRequest {
            message: format!("{what} must not be empty"),
        });
    }
    if !is_valid_id(id) {
        return Err(StoreError::InvalidRequest {
            message: format!("{what} '{id}' is not a valid document id"),
        });
    }
    Ok(())
}
