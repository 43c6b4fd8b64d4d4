use super::support::*;

#[tokio::test]
async fn every_reference_shape_resolves_to_the_same_user() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p-string", json!("u1"), 1);
    fixture.post("p-list", json!(["u1"]), 2);
    fixture.post("p-object", json!({ "$id": "u1" }), 3);

    let direct = fixture.client.get_user_by_id("u1").await.expect("user by id");
    let resolver = fixture.client.resolver();

    for post_id in ["p-string", "p-list", "p-object"] {
        let post = resolver.resolve_creator(fixture.raw_post(post_id).await).await;
        assert_eq!(post.creator, Reference::Resolved(direct.clone()), "shape {post_id}");
    }
}

#[tokio::test]
async fn resolving_a_resolved_post_is_a_no_op() {
    let mut fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!("u1"), 1);

    let resolver = fixture.client.resolver();
    let once = resolver.resolve_creator(fixture.raw_post("p1").await).await;
    let twice = resolver.resolve_creator(once.clone()).await;
    assert_eq!(once, twice);
    assert!(fixture.drain_issues().is_empty());
}

#[tokio::test]
async fn embedded_creator_is_not_fetched_again() {
    let mut fixture = Fixture::new();
    fixture.post("p1", json!({ "$id": "u1", "name": "Embedded Ada" }), 1);
    // Any fetch against users would now fail.
    fixture.store().fail_collection("users");

    let post = fixture
        .client
        .resolver()
        .resolve_creator(fixture.raw_post("p1").await)
        .await;
    assert_eq!(creator_name(&post), Some("Embedded Ada"));
    assert!(fixture.drain_issues().is_empty());
}

#[tokio::test]
async fn embedded_creator_with_blank_name_is_fetched() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.post("p1", json!({ "$id": "u1", "name": "" }), 1);

    let raw = fixture.raw_post("p1").await;
    assert_eq!(raw.creator, Reference::Unresolved("u1".to_string()));

    let post = fixture.client.resolver().resolve_creator(raw).await;
    assert_eq!(creator_name(&post), Some("Ada"));
}

#[tokio::test]
async fn one_failed_creator_does_not_fail_the_batch() {
    let mut fixture = Fixture::new();
    let mut posts = Vec::new();
    for i in 1..=5 {
        fixture.user(&format!("u{i}"), &format!("User {i}"), i);
        fixture.post(&format!("p{i}"), json!(format!("u{i}")), 10 + i);
        posts.push(fixture.raw_post(&format!("p{i}")).await);
    }
    fixture.store().fail_get("users", "u3");

    let resolved = fixture.client.resolver().resolve_creators_batch(posts).await;

    let ids: Vec<&str> = resolved.iter().map(|post| post.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);
    for (index, post) in resolved.iter().enumerate() {
        if index == 2 {
            assert_eq!(post.creator, Reference::Unresolved("u3".to_string()));
        } else {
            let expected = format!("User {}", index + 1);
            assert_eq!(creator_name(post), Some(expected.as_str()));
        }
    }

    let issues = fixture.drain_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::TransientFailure);
    assert_eq!(issues[0].document_id, "p3");
    assert_eq!(issues[0].field, "creator");
}

#[tokio::test]
async fn missing_creator_stays_unresolved_and_is_reported() {
    let mut fixture = Fixture::new();
    fixture.post("p1", json!(["ghost"]), 1);

    let post = fixture
        .client
        .resolver()
        .resolve_creator(fixture.raw_post("p1").await)
        .await;
    assert_eq!(post.creator, Reference::Unresolved("ghost".to_string()));

    let issues = fixture.drain_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::NotFound);
}

#[tokio::test]
async fn malformed_creator_is_left_untouched() {
    let mut fixture = Fixture::new();
    fixture.post("p1", json!(42), 1);
    fixture.post("p2", json!({ "name": "no id" }), 2);

    let resolver = fixture.client.resolver();
    let first = resolver.resolve_creator(fixture.raw_post("p1").await).await;
    let second = resolver.resolve_creator(fixture.raw_post("p2").await).await;
    assert_eq!(first.creator, Reference::Malformed(json!(42)));
    assert!(matches!(second.creator, Reference::Malformed(_)));

    let kinds: Vec<IssueKind> = fixture.drain_issues().into_iter().map(|issue| issue.kind).collect();
    assert_eq!(kinds, vec![IssueKind::MalformedReference, IssueKind::MalformedReference]);
}

#[tokio::test]
async fn listings_resolve_creators() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.user("u2", "Grace", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.post("p2", json!(["u2"]), 2);
    fixture.post("p3", json!("u1"), 3);

    let recent = fixture.client.get_recent_posts().await.expect("recent posts");
    let names: Vec<Option<&str>> = recent.documents.iter().map(creator_name).collect();
    assert_eq!(names, vec![Some("Ada"), Some("Grace"), Some("Ada")]);
    assert_eq!(recent.documents[0].id, "p3");

    let single = fixture.client.get_post_by_id("p2").await.expect("post by id");
    assert_eq!(creator_name(&single), Some("Grace"));
}

#[tokio::test]
async fn missing_post_is_an_error_for_direct_lookup() {
    let fixture = Fixture::new();
    let err = fixture.client.get_post_by_id("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}
