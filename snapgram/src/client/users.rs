use serde_json::Map;

use super::{Client, require_id};
use crate::{
    errors::StoreError,
    models::{NewUser, UpdateUser, User},
    query::Query,
    store::DocumentStore,
    types::{CREATED_AT_ATTRIBUTE, DocumentList},
};

impl<S: DocumentStore> Client<S> {
    pub async fn save_user_to_db(&self, user: NewUser) -> Result<User, StoreError> {
        self.insert(&self.collections.users, user).await
    }

    /// Newest users first. `limit` defaults to the store's page size.
    pub async fn get_users(&self, limit: Option<u64>) -> Result<DocumentList<User>, StoreError> {
        let mut queries = vec![Query::order_desc(CREATED_AT_ATTRIBUTE)];
        if let Some(limit) = limit {
            queries.push(Query::limit(limit));
        }
        self.store
            .list_documents(&self.collections.users, &queries)
            .await?
            .decode()
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User, StoreError> {
        require_id("user id", user_id)?;
        self.resolver().fetch_user(user_id).await
    }

    pub async fn update_user(&self, user: UpdateUser) -> Result<User, StoreError> {
        let user_id = user.user_id.clone();
        self.patch(&self.collections.users, &user_id, user).await
    }

    /// Makes `current_user_id` follow `target_user_id` and returns the updated target.
    ///
    /// Following someone already followed changes nothing.
    pub async fn follow_user(&self, current_user_id: &str, target_user_id: &str) -> Result<User, StoreError> {
        let (mut current, mut target) = self.follow_pair(current_user_id, target_user_id).await?;
        let changed_following = current.following.insert(target_user_id);
        let changed_followers = target.followers.insert(current_user_id);
        self.write_follow_lists(&current, &target, changed_following, changed_followers)
            .await
    }

    /// Makes `current_user_id` stop following `target_user_id` and returns the updated target.
    pub async fn unfollow_user(&self, current_user_id: &str, target_user_id: &str) -> Result<User, StoreError> {
        let (mut current, mut target) = self.follow_pair(current_user_id, target_user_id).await?;
        let changed_following = current.following.remove(target_user_id);
        let changed_followers = target.followers.remove(current_user_id);
        self.write_follow_lists(&current, &target, changed_following, changed_followers)
            .await
    }

    async fn follow_pair(&self, current_user_id: &str, target_user_id: &str) -> Result<(User, User), StoreError> {
        require_id("user id", current_user_id)?;
        require_id("user id", target_user_id)?;
        if current_user_id == target_user_id {
            return Err(StoreError::InvalidRequest {
                message: "Cannot follow yourself".to_string(),
            });
        }
        let resolver = self.resolver();
        let current = resolver.fetch_user(current_user_id).await?;
        let target = resolver.fetch_user(target_user_id).await?;
        Ok((current, target))
    }

    async fn write_follow_lists(
        &self,
        current: &User,
        target: &User,
        changed_following: bool,
        changed_followers: bool,
    ) -> Result<User, StoreError> {
        if changed_following {
            let mut data = Map::new();
            data.insert("following".to_string(), current.following.to_value());
            self.store
                .update_document(&self.collections.users, &current.id, data)
                .await?;
        }
        if !changed_followers {
            return Ok(target.clone());
        }
        let mut data = Map::new();
        data.insert("followers".to_string(), target.followers.to_value());
        self.store
            .update_document(&self.collections.users, &target.id, data)
            .await?
            .decode()
    }

    /// Whether `current_user_id` follows `target_user_id`.
    pub async fn is_following(&self, current_user_id: &str, target_user_id: &str) -> Result<bool, StoreError> {
        let current = self.get_user_by_id(current_user_id).await?;
        Ok(current.following.contains(target_user_id))
    }
}
