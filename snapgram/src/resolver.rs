//! # Relationship Resolver
//!
//! Replaces reference fields in listed documents with the entities they point
//! at: a post's `creator`, a save's `post` (and that post's creator), and a
//! comment's `userId`. A save's post is always read from the store, even when
//! the save embeds a copy of it.
//!
//! Resolution never fails the caller. A reference that cannot be resolved is
//! left as it was (for saves, the entry is dropped), logged at `warn`, and
//! reported as a [`ResolutionIssue`] on the optional diagnostic channel.
//!
//! Per-item work inside a batch runs concurrently through `join_all`, which
//! keeps output order equal to input order.

use std::collections::HashSet;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    config::{COMMENTS_COLLECTION, Collections},
    errors::{IssueKind, StoreError},
    models::{Comment, Post, Save, SavedPost, User},
    query::Query,
    store::{DocumentStore, list_all},
    types::{CREATED_AT_ATTRIBUTE, Document, Entity, Reference},
};

/// Sender half of the diagnostic channel.
pub type DiagnosticSink = UnboundedSender<ResolutionIssue>;

/// A swallowed resolution failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionIssue {
    pub kind: IssueKind,
    /// Collection of the document that holds the reference.
    pub collection: String,
    pub document_id: String,
    pub field: &'static str,
    pub message: String,
}

pub struct Resolver<'a, S> {
    store: &'a S,
    collections: &'a Collections,
    diagnostics: Option<&'a DiagnosticSink>,
}

impl<'a, S: DocumentStore> Resolver<'a, S> {
    pub fn new(store: &'a S, collections: &'a Collections) -> Self {
        Self {
            store,
            collections,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, sink: Option<&'a DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Fetches a single user by id.
    pub async fn fetch_user(&self, user_id: &str) -> Result<User, StoreError> {
        self.fetch(&self.collections.users, user_id).await
    }

    /// Resolves the post's creator. A post whose creator is already resolved
    /// is returned unchanged.
    pub async fn resolve_creator(&self, mut post: Post) -> Post {
        let creator = std::mem::take(&mut post.creator);
        post.creator = self
            .resolve_user(creator, &self.collections.posts, &post.id, "creator")
            .await;
        post
    }

    /// Resolves the creator of every post. Order is preserved and one failure
    /// never affects the others.
    pub async fn resolve_creators_batch(&self, posts: Vec<Post>) -> Vec<Post> {
        join_all(posts.into_iter().map(|post| self.resolve_creator(post))).await
    }

    /// Lists the user's saved posts, newest save first.
    ///
    /// Saves whose post is gone or unreadable are dropped, and only the most
    /// recent save of each post is kept. Only a failure to list the saves
    /// themselves is returned as an error.
    pub async fn resolve_saved_posts(&self, user_id: &str) -> Result<Vec<SavedPost>, StoreError> {
        let documents = list_all(
            self.store,
            &self.collections.saves,
            &[Query::equal("user", user_id), Query::order_desc(CREATED_AT_ATTRIBUTE)],
        )
        .await?;
        let saves: Vec<Save> = self.decode_all(&self.collections.saves, documents);

        let resolved = join_all(saves.into_iter().map(|save| self.resolve_save(save))).await;

        let mut seen = HashSet::new();
        let saved_posts: Vec<SavedPost> = resolved
            .into_iter()
            .flatten()
            .filter(|saved| seen.insert(saved.post.id.clone()))
            .collect();
        log::debug!("resolved {} saved posts for user {user_id}", saved_posts.len());
        Ok(saved_posts)
    }

    /// Lists a post's comments, newest first, with authors resolved.
    ///
    /// A comment whose author cannot be resolved is kept without an author.
    pub async fn resolve_comment_authors(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let documents = list_all(
            self.store,
            COMMENTS_COLLECTION,
            &[Query::equal("postId", post_id), Query::order_desc(CREATED_AT_ATTRIBUTE)],
        )
        .await?;
        let comments: Vec<Comment> = self.decode_all(COMMENTS_COLLECTION, documents);

        Ok(join_all(comments.into_iter().map(|comment| self.resolve_author(comment))).await)
    }

    /// Resolves a single comment's author, leaving it unresolved on failure.
    pub async fn resolve_author(&self, mut comment: Comment) -> Comment {
        let author = std::mem::take(&mut comment.author);
        comment.author = self
            .resolve_user(author, COMMENTS_COLLECTION, &comment.id, "userId")
            .await;
        comment
    }

    async fn resolve_save(&self, save: Save) -> Option<SavedPost> {
        // Read the stored post even when the save embeds a copy of it.
        let fetched = match save.post.target("post") {
            Ok(post_id) => self.fetch::<Post>(&self.collections.posts, post_id).await,
            Err(err) => Err(err),
        };
        let post = match fetched {
            Ok(post) => post,
            Err(err) => {
                self.report(err.issue_kind(), &self.collections.saves, &save.id, "post", err.to_string());
                return None;
            }
        };

        Some(SavedPost {
            save_id: save.id,
            saved_at: save.created_at,
            post: self.resolve_creator(post).await,
        })
    }

    async fn resolve_user(
        &self,
        reference: Reference<User>,
        collection: &str,
        document_id: &str,
        field: &'static str,
    ) -> Reference<User> {
        match reference {
            Reference::Resolved(_) => reference,
            Reference::Unresolved(user_id) => match self.fetch_user(&user_id).await {
                Ok(user) => Reference::Resolved(user),
                Err(err) => {
                    self.report(err.issue_kind(), collection, document_id, field, err.to_string());
                    Reference::Unresolved(user_id)
                }
            },
            Reference::Malformed(raw) => {
                let err = StoreError::malformed(field, raw.clone());
                self.report(err.issue_kind(), collection, document_id, field, err.to_string());
                Reference::Malformed(raw)
            }
        }
    }

    async fn fetch<T: Entity>(&self, collection: &str, document_id: &str) -> Result<T, StoreError> {
        self.store.get_document(collection, document_id).await?.decode()
    }

    fn decode_all<T: DeserializeOwned>(&self, collection: &str, documents: Vec<Document>) -> Vec<T> {
        documents
            .into_iter()
            .filter_map(|document| {
                let document_id = document.id.clone();
                match document.decode() {
                    Ok(entity) => Some(entity),
                    Err(err) => {
                        self.report(
                            IssueKind::MalformedReference,
                            collection,
                            &document_id,
                            "$document",
                            err.to_string(),
                        );
                        None
                    }
                }
            })
            .collect()
    }

    fn report(&self, kind: IssueKind, collection: &str, document_id: &str, field: &'static str, message: String) {
        log::warn!(
            "unresolved {field} on {collection}/{document_id} ({}): {message}",
            kind.as_str()
        );
        if let Some(sink) = self.diagnostics {
            // A dropped receiver only means nobody is listening.
            let _ = sink.send(ResolutionIssue {
                kind,
                collection: collection.to_string(),
                document_id: document_id.to_string(),
                field,
                message,
            });
        }
    }
}
