use serde_json::{Map, Value};

use super::{Client, require_id};
use crate::{
    errors::StoreError,
    models::{Save, SavedPost},
    query::Query,
    store::DocumentStore,
    types::Document,
};

impl<S: DocumentStore> Client<S> {
    /// Saves `post_id` for `user_id`.
    ///
    /// Returns the existing save when the user already saved the post. The
    /// check and the create are separate calls, so two concurrent saves can
    /// still both succeed; listing deduplicates them.
    pub async fn save_post(&self, user_id: &str, post_id: &str) -> Result<Save, StoreError> {
        require_id("user id", user_id)?;
        require_id("post id", post_id)?;

        if let Some(existing) = self.find_save(user_id, post_id).await? {
            log::debug!("post {post_id} already saved by {user_id} as {}", existing.id);
            return existing.decode();
        }

        let mut data = Map::new();
        data.insert("user".to_string(), Value::from(user_id));
        data.insert("post".to_string(), Value::from(post_id));
        self.create(&self.collections.saves, data).await
    }

    pub async fn delete_saved_post(&self, save_id: &str) -> Result<(), StoreError> {
        require_id("save id", save_id)?;
        self.store.delete_document(&self.collections.saves, save_id).await
    }

    /// The user's saved posts, newest first, one entry per post.
    pub async fn get_saved_posts(&self, user_id: &str) -> Result<Vec<SavedPost>, StoreError> {
        require_id("user id", user_id)?;
        self.resolver().resolve_saved_posts(user_id).await
    }

    /// Id of the user's save of `post_id`, if any.
    pub async fn saved_post_id(&self, user_id: &str, post_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.find_save(user_id, post_id).await?.map(|doc| doc.id))
    }

    async fn find_save(&self, user_id: &str, post_id: &str) -> Result<Option<Document>, StoreError> {
        let existing = self
            .store
            .list_documents(
                &self.collections.saves,
                &[Query::equal("user", user_id), Query::equal("post", post_id), Query::limit(1)],
            )
            .await?;
        Ok(existing.documents.into_iter().next())
    }
}
