use serde_json::{Map, Value};

use super::{Client, require_id};
use crate::{
    config::COMMENTS_COLLECTION,
    errors::{StoreError, ValidationError},
    models::Comment,
    store::DocumentStore,
    validators::{MAX_TEXT_LENGTH, within_text_limit},
};

impl<S: DocumentStore> Client<S> {
    pub async fn create_comment(&self, user_id: &str, post_id: &str, text: &str) -> Result<Comment, StoreError> {
        require_id("user id", user_id)?;
        require_id("post id", post_id)?;
        if text.trim().is_empty() {
            return Err(ValidationError::single("commentText", "required", "comment must not be empty").into());
        }
        if !within_text_limit(text) {
            return Err(ValidationError::single(
                "commentText",
                "length",
                format!("comment must be at most {MAX_TEXT_LENGTH} characters"),
            )
            .into());
        }

        let mut data = Map::new();
        data.insert("commentText".to_string(), Value::from(text));
        data.insert("userId".to_string(), Value::from(user_id));
        data.insert("postId".to_string(), Value::from(post_id));
        let comment = self.create(COMMENTS_COLLECTION, data).await?;
        Ok(self.resolver().resolve_author(comment).await)
    }

    /// Comments on `post_id`, newest first, with authors resolved.
    pub async fn get_post_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        require_id("post id", post_id)?;
        self.resolver().resolve_comment_authors(post_id).await
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        require_id("comment id", comment_id)?;
        self.store.delete_document(COMMENTS_COLLECTION, comment_id).await
    }
}
