//! Typed records for the four collections and the inputs that create or patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    errors::{ValidationError, ValidationIssue, ValidationResult},
    types::{Entity, IdList, Reference, deserialize_ids},
    validators::{MAX_TEXT_LENGTH, is_valid_email, is_valid_url, within_text_limit},
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "imageId", default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: IdList,
    #[serde(default)]
    pub following: IdList,
}

impl Entity for User {
    const DISPLAY_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub creator: Reference<User>,
    #[serde(default)]
    pub caption: String,
    #[serde(rename = "imageUrls", default)]
    pub image_urls: Vec<String>,
    #[serde(rename = "imageIds", default)]
    pub image_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// User ids, in the order the likes were added. Storage does not dedupe.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub likes: Vec<String>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "postedAt", default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    /// Like list after `user_id` toggles their like.
    pub fn toggle_like(&self, user_id: &str) -> Vec<String> {
        if self.is_liked_by(user_id) {
            self.likes.iter().filter(|id| *id != user_id).cloned().collect()
        } else {
            let mut likes = self.likes.clone();
            likes.push(user_id.to_string());
            likes
        }
    }

    pub fn creator(&self) -> Option<&User> {
        self.creator.as_resolved()
    }
}

impl Entity for Post {
    const DISPLAY_FIELD: &'static str = "caption";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Join record marking a post as saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Save {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Reference<User>,
    #[serde(default)]
    pub post: Reference<Post>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "postId", default)]
    pub post_id: String,
    #[serde(rename = "userId", default)]
    pub author: Reference<User>,
    #[serde(rename = "commentText", default)]
    pub comment_text: String,
}

impl Comment {
    /// The author, when it has been resolved.
    pub fn author(&self) -> Option<&User> {
        self.author.as_resolved()
    }
}

impl Entity for Comment {
    const DISPLAY_FIELD: &'static str = "commentText";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A saved post with its creator resolved, tagged with the save that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedPost {
    #[serde(rename = "saveId")]
    pub save_id: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub post: Post,
}

/// Splits a comma-separated tag string after removing every space.
///
/// Empty segments are dropped, so an empty or absent string yields no tags.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.replace(' ', "")
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mutation inputs
// ═══════════════════════════════════════════════════════════════════════════════

/// Input that validates itself and produces the document data to write.
pub trait MutationPayload {
    type Entity: Entity;

    fn into_payload(self) -> ValidationResult<Map<String, Value>>;
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn check_images(issues: &mut Vec<ValidationIssue>, image_urls: &[String], image_ids: &[String]) {
    if image_urls.is_empty() {
        issues.push(ValidationIssue::new("imageUrls", "required", "at least one image is required"));
    }
    if image_urls.len() != image_ids.len() {
        issues.push(ValidationIssue::new(
            "imageIds",
            "length_mismatch",
            format!("{} image urls but {} image ids", image_urls.len(), image_ids.len()),
        ));
    }
    for (index, url) in image_urls.iter().enumerate() {
        if !is_valid_url(url) {
            issues.push(ValidationIssue::new(
                format!("imageUrls[{index}]"),
                "url",
                format!("'{url}' is not a valid url"),
            ));
        }
    }
}

fn check_caption(issues: &mut Vec<ValidationIssue>, caption: &str) {
    if !within_text_limit(caption) {
        issues.push(ValidationIssue::new(
            "caption",
            "length",
            format!("caption must be at most {MAX_TEXT_LENGTH} characters"),
        ));
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub account_id: String,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub image_url: Option<String>,
}

impl MutationPayload for NewUser {
    type Entity = User;

    fn into_payload(self) -> ValidationResult<Map<String, Value>> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("name", "required", "name must not be empty"));
        }
        if !is_valid_email(&self.email) {
            issues.push(ValidationIssue::new("email", "email", "email address is invalid"));
        }
        if let Some(url) = &self.image_url
            && !is_valid_url(url)
        {
            issues.push(ValidationIssue::new("imageUrl", "url", "avatar url is invalid"));
        }
        ValidationError::new(issues).into_result()?;

        Ok(into_map(json!({
            "accountId": self.account_id,
            "name": self.name,
            "username": self.username,
            "email": self.email,
            "imageUrl": self.image_url,
            "followers": [],
            "following": [],
        })))
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub image_id: Option<String>,
}

impl MutationPayload for UpdateUser {
    type Entity = User;

    fn into_payload(self) -> ValidationResult<Map<String, Value>> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("name", "required", "name must not be empty"));
        }
        if let Some(bio) = &self.bio
            && !within_text_limit(bio)
        {
            issues.push(ValidationIssue::new(
                "bio",
                "length",
                format!("bio must be at most {MAX_TEXT_LENGTH} characters"),
            ));
        }
        if let Some(url) = &self.image_url
            && !is_valid_url(url)
        {
            issues.push(ValidationIssue::new("imageUrl", "url", "avatar url is invalid"));
        }
        ValidationError::new(issues).into_result()?;

        let mut payload = into_map(json!({ "name": self.name, "bio": self.bio }));
        if let Some(url) = self.image_url {
            payload.insert("imageUrl".to_string(), Value::String(url));
        }
        if let Some(id) = self.image_id {
            payload.insert("imageId".to_string(), Value::String(id));
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub user_id: String,
    pub caption: String,
    pub image_urls: Vec<String>,
    pub image_ids: Vec<String>,
    pub location: Option<String>,
    /// Raw comma-separated tag string as typed by the user.
    pub tags: Option<String>,
}

impl MutationPayload for NewPost {
    type Entity = Post;

    fn into_payload(self) -> ValidationResult<Map<String, Value>> {
        let mut issues = Vec::new();
        if self.user_id.is_empty() {
            issues.push(ValidationIssue::new("creator", "required", "creator id must not be empty"));
        }
        check_caption(&mut issues, &self.caption);
        check_images(&mut issues, &self.image_urls, &self.image_ids);
        ValidationError::new(issues).into_result()?;

        Ok(into_map(json!({
            "creator": [self.user_id],
            "caption": self.caption,
            "imageUrls": self.image_urls,
            "imageIds": self.image_ids,
            "location": self.location,
            "tags": parse_tags(self.tags.as_deref()),
            "likes": [],
            "isActive": true,
            "postedAt": Utc::now(),
        })))
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub post_id: String,
    pub caption: String,
    pub image_urls: Vec<String>,
    pub image_ids: Vec<String>,
    pub location: Option<String>,
    pub tags: Option<String>,
}

impl MutationPayload for UpdatePost {
    type Entity = Post;

    fn into_payload(self) -> ValidationResult<Map<String, Value>> {
        let mut issues = Vec::new();
        check_caption(&mut issues, &self.caption);
        check_images(&mut issues, &self.image_urls, &self.image_ids);
        ValidationError::new(issues).into_result()?;

        Ok(into_map(json!({
            "caption": self.caption,
            "imageUrls": self.image_urls,
            "imageIds": self.image_ids,
            "location": self.location,
            "tags": parse_tags(self.tags.as_deref()),
        })))
    }
}
