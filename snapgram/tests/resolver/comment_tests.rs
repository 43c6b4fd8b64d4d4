use super::support::*;

fn author_name(comment: &Comment) -> Option<&str> {
    comment.author().map(|user| user.name.as_str())
}

#[tokio::test]
async fn comments_are_newest_first_with_authors() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.user("u2", "Grace", 0);
    fixture.post("p1", json!("u1"), 1);
    fixture.post("p2", json!("u1"), 2);
    fixture.comment("c1", "p1", json!("u2"), "first", 10);
    fixture.comment("c2", "p1", json!(["u1"]), "second", 11);
    fixture.comment("c3", "p2", json!("u2"), "elsewhere", 12);

    let comments = fixture.client.get_post_comments("p1").await.expect("comments");
    let ids: Vec<&str> = comments.iter().map(|comment| comment.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1"]);
    assert_eq!(author_name(&comments[0]), Some("Ada"));
    assert_eq!(author_name(&comments[1]), Some("Grace"));
}

#[tokio::test]
async fn unresolved_author_keeps_the_comment() {
    let mut fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);
    fixture.comment("c1", "p1", json!("u1"), "kept", 10);
    fixture.comment("c2", "p1", json!("ghost"), "also kept", 11);
    fixture.comment("c3", "p1", Value::Null, "no author at all", 12);

    let comments = fixture.client.get_post_comments("p1").await.expect("comments");
    assert_eq!(comments.len(), 3);
    assert_eq!(author_name(&comments[0]), None);
    assert_eq!(author_name(&comments[1]), None);
    assert_eq!(comments[1].author, Reference::Unresolved("ghost".to_string()));
    assert_eq!(author_name(&comments[2]), Some("Ada"));

    let kinds: Vec<IssueKind> = fixture.drain_issues().into_iter().map(|issue| issue.kind).collect();
    assert!(kinds.contains(&IssueKind::NotFound));
    assert!(kinds.contains(&IssueKind::MalformedReference));
}

#[tokio::test]
async fn new_comment_comes_back_with_its_author() {
    let fixture = Fixture::new();
    fixture.user("u1", "Ada", 0);

    let comment = fixture
        .client
        .create_comment("u1", "p1", "looks great")
        .await
        .expect("create comment");
    assert_eq!(comment.comment_text, "looks great");
    assert_eq!(comment.post_id, "p1");
    assert_eq!(author_name(&comment), Some("Ada"));

    let listed = fixture.client.get_post_comments("p1").await.expect("comments");
    assert_eq!(listed.len(), 1);

    fixture.client.delete_comment(&comment.id).await.expect("delete");
    assert!(fixture.client.get_post_comments("p1").await.expect("comments").is_empty());
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let fixture = Fixture::new();
    let err = fixture.client.create_comment("u1", "p1", "   ").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
