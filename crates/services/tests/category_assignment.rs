mod common;

use serde_json::json;

use admin_core::model::{CategoryLevelId, InstructorId};
use api::Method;
use api::memory::Reply;
use services::{AssignmentError, CategoryAssignment};

use common::{Harness, category_level_row};

#[tokio::test]
async fn toggling_updates_membership_after_server_confirms() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        "/api/instructors/4/categories",
        Reply::ok(json!([category_level_row(1, "B", "manual")])),
    );
    h.transport.reply(
        Method::Post,
        "/api/instructors/4/categories",
        Reply::detail(200, "Category added"),
    );
    h.transport.reply(
        Method::Delete,
        "/api/instructors/4/categories/1",
        Reply::detail(403, "You have no permissions"),
    );
    let assignment = CategoryAssignment::new(h.api.clone(), h.notifier(), InstructorId::new(4));

    assignment.load().await.unwrap();
    let assigned: Vec<bool> = assignment.rows().iter().map(|row| row.assigned).collect();
    assert_eq!(assigned, vec![true, false]);
    assert_eq!(assignment.rows()[1].label, "B auto");

    let detail = assignment
        .set_assigned(CategoryLevelId::new(2), true)
        .await
        .unwrap();
    assert_eq!(detail, "Category added");
    let post = &h.transport.requests_to(Method::Post, "/api/instructors/4/categories")[0];
    assert_eq!(post.query_param("category_level_id"), Some("2"));

    let err = assignment
        .set_assigned(CategoryLevelId::new(1), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AssignmentError::Api(_)));

    let assigned: Vec<bool> = assignment.rows().iter().map(|row| row.assigned).collect();
    assert_eq!(assigned, vec![true, true]);
    assert_eq!(h.notes.successes(), vec!["Category added".to_string()]);
    assert_eq!(h.notes.errors(), vec!["You have no permissions".to_string()]);
}

#[tokio::test]
async fn unknown_category_is_refused_locally() {
    let h = Harness::new();
    h.transport
        .reply(Method::Get, "/api/instructors/4/categories", Reply::ok(json!([])));
    let assignment = CategoryAssignment::new(h.api.clone(), h.notifier(), InstructorId::new(4));
    assignment.load().await.unwrap();

    let err = assignment
        .set_assigned(CategoryLevelId::new(9), true)
        .await
        .unwrap_err();

    assert!(matches!(err, AssignmentError::UnknownCategory(9)));
    assert!(h.transport.requests_to(Method::Post, "/api/instructors/4/categories").is_empty());
}
