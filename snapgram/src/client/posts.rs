use serde_json::{Map, json};

use super::{Client, require_id};
use crate::{
    errors::StoreError,
    models::{NewPost, Post, UpdatePost},
    query::Query,
    store::DocumentStore,
    types::{CREATED_AT_ATTRIBUTE, DocumentList, UPDATED_AT_ATTRIBUTE},
};

impl<S: DocumentStore> Client<S> {
    pub async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let post = self.insert(&self.collections.posts, post).await?;
        Ok(self.resolver().resolve_creator(post).await)
    }

    pub async fn update_post(&self, post: UpdatePost) -> Result<Post, StoreError> {
        let post_id = post.post_id.clone();
        let post = self.patch(&self.collections.posts, &post_id, post).await?;
        Ok(self.resolver().resolve_creator(post).await)
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), StoreError> {
        require_id("post id", post_id)?;
        self.store.delete_document(&self.collections.posts, post_id).await
    }

    /// Replaces the post's like list.
    pub async fn like_post(&self, post_id: &str, likes: &[String]) -> Result<Post, StoreError> {
        require_id("post id", post_id)?;
        let mut data = Map::new();
        data.insert("likes".to_string(), json!(likes));
        self.store
            .update_document(&self.collections.posts, post_id, data)
            .await?
            .decode()
    }

    /// Adds or removes `user_id` from the post's likes.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<Post, StoreError> {
        require_id("user id", user_id)?;
        let post = self.get_post(post_id).await?;
        self.like_post(post_id, &post.toggle_like(user_id)).await
    }

    /// Fetches one post with its creator resolved.
    pub async fn get_post_by_id(&self, post_id: &str) -> Result<Post, StoreError> {
        let post = self.get_post(post_id).await?;
        Ok(self.resolver().resolve_creator(post).await)
    }

    /// Newest posts first, capped at the configured recent limit.
    pub async fn get_recent_posts(&self) -> Result<DocumentList<Post>, StoreError> {
        self.list_posts(vec![
            Query::order_desc(CREATED_AT_ATTRIBUTE),
            Query::limit(self.feed.recent_limit),
        ])
        .await
    }

    /// One page of the infinite feed, most recently updated first.
    ///
    /// Pass the id of the last post of the previous page as `cursor`.
    pub async fn get_infinite_posts(&self, cursor: Option<&str>) -> Result<DocumentList<Post>, StoreError> {
        let mut queries = vec![
            Query::order_desc(UPDATED_AT_ATTRIBUTE),
            Query::limit(self.feed.page_size),
        ];
        if let Some(cursor) = cursor {
            queries.push(Query::cursor_after(cursor));
        }
        self.list_posts(queries).await
    }

    /// Full-text search on captions.
    pub async fn search_posts(&self, term: &str) -> Result<DocumentList<Post>, StoreError> {
        self.list_posts(vec![Query::search("caption", term)]).await
    }

    pub async fn get_user_posts(&self, user_id: &str) -> Result<DocumentList<Post>, StoreError> {
        if user_id.is_empty() {
            return Ok(DocumentList::empty());
        }
        self.list_posts(vec![
            Query::equal("creator", user_id),
            Query::order_desc(CREATED_AT_ATTRIBUTE),
        ])
        .await
    }

    /// Posts whose like list contains `user_id`.
    pub async fn get_user_liked_posts(&self, user_id: &str) -> Result<DocumentList<Post>, StoreError> {
        if user_id.is_empty() {
            return Ok(DocumentList::empty());
        }
        self.list_posts(vec![
            Query::equal("likes", user_id),
            Query::order_desc(CREATED_AT_ATTRIBUTE),
        ])
        .await
    }

    async fn get_post(&self, post_id: &str) -> Result<Post, StoreError> {
        require_id("post id", post_id)?;
        self.store
            .get_document(&self.collections.posts, post_id)
            .await?
            .decode()
    }

    async fn list_posts(&self, queries: Vec<Query>) -> Result<DocumentList<Post>, StoreError> {
        let list = self
            .store
            .list_documents(&self.collections.posts, &queries)
            .await?
            .decode::<Post>()?;
        let total = list.total;
        let posts = self.resolver().resolve_creators_batch(list.documents).await;
        Ok(DocumentList { total, documents: posts })
    }
}
