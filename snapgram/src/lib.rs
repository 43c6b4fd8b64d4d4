//! Snapgram core library.
//!
//! Typed social data (users, posts, saves, comments) over a backend document
//! store, plus the relationship resolver that turns raw reference fields into
//! materialized entities.

pub mod client;
pub mod config;
pub mod errors;
pub mod id;
pub mod keys;
pub mod models;
pub mod query;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validators;

pub use client::Client;
pub use config::{COMMENTS_COLLECTION, Collections, FeedSettings, SnapgramConfig};
pub use errors::*;
pub use models::{
    Comment, MutationPayload, NewPost, NewUser, Post, Save, SavedPost, UpdatePost, UpdateUser, User, parse_tags,
};
pub use query::{DEFAULT_LIMIT, MAX_LIMIT, Query, QueryPlan, SortOrder};
pub use resolver::{DiagnosticSink, ResolutionIssue, Resolver};
pub use store::{DocumentStore, MemoryStore, RedisStore, list_all};
pub use types::{Document, DocumentList, Entity, IdList, Reference, reference_id};

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;
