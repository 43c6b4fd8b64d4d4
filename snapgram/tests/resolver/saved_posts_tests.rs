use super::support::*;

fn post_ids(saved: &[SavedPost]) -> Vec<&str> {
    saved.iter().map(|entry| entry.post.id.as_str()).collect()
}

#[tokio::test]
async fn zero_saves_is_an_empty_list() {
    let fixture = Fixture::new();
    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert!(saved.is_empty());
}

#[tokio::test]
async fn duplicate_saves_keep_the_most_recent() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.save("s-old", "u1", json!("p1"), 5);
    fixture.save("s-new", "u1", json!(["p1"]), 9);

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].save_id, "s-new");
    assert_eq!(saved[0].saved_at, at(9));
    assert_eq!(creator_name(&saved[0].post), Some("Ada"));
}

#[tokio::test]
async fn embedded_post_is_read_from_the_store() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.save(
        "s1",
        "u1",
        json!({ "$id": "p1", "caption": "stale caption", "creator": "u1" }),
        5,
    );

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].post.caption, "caption of p1");
    assert_eq!(creator_name(&saved[0].post), Some("Ada"));
}

#[tokio::test]
async fn embedded_post_that_was_deleted_is_dropped() {
    let mut fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.save("s-kept", "u1", json!({ "$id": "p1" }), 5);
    fixture.save(
        "s-gone",
        "u1",
        json!({ "$id": "gone", "caption": "old snapshot", "creator": "u1" }),
        6,
    );

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(post_ids(&saved), vec!["p1"]);

    let issues = fixture.drain_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].document_id, "s-gone");
    assert_eq!(issues[0].kind, IssueKind::NotFound);
    assert_eq!(issues[0].field, "post");
}

#[tokio::test]
async fn saves_are_listed_newest_first_with_creators() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.user("u2", "Grace", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.post("p2", json!(["u2"]), 2);
    fixture.post("p3", json!("u1"), 3);
    fixture.save("s1", "u1", json!("p2"), 10);
    fixture.save("s2", "u1", json!("p1"), 12);
    fixture.save("s3", "u1", json!("p3"), 11);
    fixture.save("s4", "u2", json!("p3"), 13);

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(post_ids(&saved), vec!["p1", "p3", "p2"]);
    let creators: Vec<Option<&str>> = saved.iter().map(|entry| creator_name(&entry.post)).collect();
    assert_eq!(creators, vec![Some("Ada"), Some("Ada"), Some("Grace")]);
}

#[tokio::test]
async fn dangling_and_malformed_saves_are_dropped() {
    let mut fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.save("s-ok", "u1", json!("p1"), 10);
    fixture.save("s-deleted", "u1", json!("deleted-post"), 11);
    fixture.save("s-bad", "u1", json!(true), 12);

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(post_ids(&saved), vec!["p1"]);

    let mut kinds: Vec<(String, IssueKind)> = fixture
        .drain_issues()
        .into_iter()
        .map(|issue| (issue.document_id, issue.kind))
        .collect();
    kinds.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        kinds,
        vec![
            ("s-bad".to_string(), IssueKind::MalformedReference),
            ("s-deleted".to_string(), IssueKind::NotFound),
        ]
    );
}

#[tokio::test]
async fn saved_post_keeps_unresolved_creator() {
    let fixture = Fixture::new();
    fixture.post("p1", json!("missing-user"), 1);
    fixture.save("s1", "u1", json!("p1"), 10);

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].post.creator, Reference::Unresolved("missing-user".to_string()));
}

#[tokio::test]
async fn failing_save_listing_is_an_error() {
    let fixture = Fixture::new();
    fixture.store().fail_collection("saves");
    let err = fixture.client.get_saved_posts("u1").await.unwrap_err();
    assert!(matches!(err, StoreError::Transient { .. }));
}

#[tokio::test]
async fn saved_posts_page_past_the_list_limit() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    for i in 0..130 {
        let post_id = format!("p{i:03}");
        fixture.post(&post_id, json!("u1"), i);
        fixture.save(&format!("s{i:03}"), "u1", json!(post_id), 200 + i);
    }

    let saved = fixture.client.get_saved_posts("u1").await.expect("saved posts");
    assert_eq!(saved.len(), 130);
    assert_eq!(saved[0].post.id, "p129");
    assert_eq!(saved[129].post.id, "p000");
}
