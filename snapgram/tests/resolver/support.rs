pub(crate) use chrono::{DateTime, Duration, TimeZone, Utc};
pub(crate) use serde_json::{Value, json};
pub(crate) use snapgram::{
    Client, Comment, Document, DocumentStore, IssueKind, MemoryStore, Post, Reference, ResolutionIssue, SavedPost,
    StoreError,
};
pub(crate) use tokio::sync::mpsc::UnboundedReceiver;

/// Fixed clock so ordering assertions do not depend on wall time.
pub(crate) fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

pub(crate) fn document(collection: &str, id: &str, minute: i64, data: Value) -> Document {
    let Value::Object(data) = data else {
        panic!("document data must be an object");
    };
    let mut document = Document::new(collection, id, data);
    document.created_at = at(minute);
    document.updated_at = at(minute);
    document
}

pub(crate) struct Fixture {
    pub client: Client<MemoryStore>,
    pub issues: UnboundedReceiver<ResolutionIssue>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let mut client = Client::new(MemoryStore::new());
        let issues = client.diagnostics_channel();
        Self { client, issues }
    }

    pub(crate) fn store(&self) -> &MemoryStore {
        self.client.store()
    }

    pub(crate) fn user(&self, id: &str, name: &str, minute: i64) {
        self.store().seed(document(
            "users",
            id,
            minute,
            json!({
                "name": name,
                "username": name.to_lowercase(),
                "email": format!("{}@example.com", name.to_lowercase()),
                "followers": "[]",
                "following": [],
            }),
        ));
    }

    pub(crate) fn post(&self, id: &str, creator: Value, minute: i64) {
        self.store().seed(document(
            "posts",
            id,
            minute,
            json!({
                "creator": creator,
                "caption": format!("caption of {id}"),
                "imageUrls": [format!("https://cdn.example.com/{id}.png")],
                "imageIds": [format!("file-{id}")],
                "tags": ["test"],
                "likes": [],
            }),
        ));
    }

    pub(crate) fn save(&self, id: &str, user: &str, post: Value, minute: i64) {
        self.store()
            .seed(document("saves", id, minute, json!({ "user": user, "post": post })));
    }

    pub(crate) fn comment(&self, id: &str, post: &str, author: Value, text: &str, minute: i64) {
        self.store().seed(document(
            "comments",
            id,
            minute,
            json!({ "postId": post, "userId": author, "commentText": text }),
        ));
    }

    /// Reads a post without resolving anything.
    pub(crate) async fn raw_post(&self, id: &str) -> Post {
        self.store()
            .get_document("posts", id)
            .await
            .expect("post exists")
            .decode()
            .expect("post decodes")
    }

    pub(crate) fn drain_issues(&mut self) -> Vec<ResolutionIssue> {
        let mut issues = Vec::new();
        while let Ok(issue) = self.issues.try_recv() {
            issues.push(issue);
        }
        issues
    }
}

pub(crate) fn creator_name(post: &Post) -> Option<&str> {
    post.creator().map(|user| user.name.as_str())
}
