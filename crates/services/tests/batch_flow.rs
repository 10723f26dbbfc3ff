mod common;

use std::time::Duration as Delay;

use chrono::{Duration, NaiveDate};
use serde_json::json;

use admin_core::model::{InstructorId, ScheduleError, SelectOption};
use api::memory::Reply;
use api::{ApiError, Method};
use services::{BatchError, BatchPhase, Groups, Students};

use common::{Harness, group_row, instructor_row, student_row};

const GROUPS_PAGE: &str = "/api/groups/paginated";
const GROUP_BATCH: &str = "/api/group_schedules/create_butch";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
}

#[tokio::test]
async fn end_before_start_stays_open_without_refetch() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        GROUPS_PAGE,
        Reply::ok(json!([group_row(3, "B-3", 1, 7)])),
    );
    let browser = h.browser::<Groups>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    batch.open_for_row(3).await.unwrap();
    batch
        .edit(|draft| draft.end_date = draft.start_date - Duration::days(1))
        .unwrap();
    let err = batch.submit().await.unwrap_err();

    assert!(matches!(err, BatchError::Invalid(ScheduleError::EndBeforeStart)));
    assert_eq!(batch.phase(), BatchPhase::Open);
    assert!(batch.error().is_some());
    assert!(h.transport.requests_to(Method::Post, GROUP_BATCH).is_empty());
    assert_eq!(h.transport.requests_to(Method::Get, GROUPS_PAGE).len(), 1);
}

#[tokio::test]
async fn server_rejection_stays_open_without_refetch() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        GROUPS_PAGE,
        Reply::ok(json!([group_row(3, "B-3", 1, 7)])),
    );
    h.transport.reply(
        Method::Post,
        GROUP_BATCH,
        Reply::detail(400, "Group already has a schedule"),
    );
    let browser = h.browser::<Groups>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    batch.open_for_row(3).await.unwrap();
    let err = batch.submit().await.unwrap_err();

    assert!(matches!(err, BatchError::Api(ApiError::Rejected { status: 400, .. })));
    assert_eq!(batch.phase(), BatchPhase::Open);
    assert_eq!(batch.error().as_deref(), Some("Group already has a schedule"));
    assert_eq!(
        h.notes.errors(),
        vec!["Group already has a schedule".to_string()]
    );
    assert_eq!(h.transport.requests_to(Method::Get, GROUPS_PAGE).len(), 1);
}

#[tokio::test]
async fn group_batch_success_closes_and_refetches() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        GROUPS_PAGE,
        Reply::ok(json!([group_row(3, "B-3", 1, 7)])),
    );
    h.transport.reply(
        Method::Post,
        GROUP_BATCH,
        Reply::detail(200, "Schedules created"),
    );
    let browser = h.browser::<Groups>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    batch.open_for_row(3).await.unwrap();
    let draft = batch.draft().unwrap();
    assert_eq!(draft.start_date, today() + Duration::days(1));
    assert_eq!(draft.end_date, today() + Duration::days(31));
    batch
        .edit(|draft| {
            draft.schedules_per_day = 2;
            draft.include_weekends = true;
        })
        .unwrap();
    let detail = batch.submit().await.unwrap();

    assert_eq!(detail, "Schedules created");
    assert_eq!(batch.phase(), BatchPhase::Closed);
    assert_eq!(h.notes.successes(), vec!["Schedules created".to_string()]);
    assert_eq!(h.transport.requests_to(Method::Get, GROUPS_PAGE).len(), 2);
    let post = &h.transport.requests_to(Method::Post, GROUP_BATCH)[0];
    assert_eq!(
        post.body,
        Some(json!({
            "group_id": 3,
            "start_date": "2023-11-15",
            "end_date": "2023-12-15",
            "schedules_per_day": 2,
            "include_weekends": true
        }))
    );
}

#[tokio::test]
async fn practice_batch_needs_an_instructor_of_the_students_category() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        "/api/students/paginated",
        Reply::ok(json!([student_row(21, "Orlov", 2, 5)])),
    );
    h.transport.reply(
        Method::Get,
        "/api/category_levels/2/instructors",
        Reply::ok(json!([instructor_row(8, "Smirnov")])),
    );
    h.transport.reply(
        Method::Post,
        "/api/practice_schedules/create_butch",
        Reply::detail(200, "Practice scheduled"),
    );
    let browser = h.browser::<Students>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    batch.open_for_row(21).await.unwrap();
    assert_eq!(
        batch.instructor_options(),
        vec![SelectOption::new(8, "Smirnov I.")]
    );
    let err = batch.submit().await.unwrap_err();
    assert!(matches!(err, BatchError::Invalid(ScheduleError::MissingInstructor)));
    assert_eq!(h.notes.errors(), vec!["Please select an instructor".to_string()]);

    batch.select_instructor(Some(InstructorId::new(8))).unwrap();
    batch.submit().await.unwrap();

    let post = &h.transport.requests_to(Method::Post, "/api/practice_schedules/create_butch")[0];
    let body = post.body.clone().unwrap();
    assert_eq!(body["student_id"], json!(21));
    assert_eq!(body["instructor_id"], json!(8));
}

#[tokio::test]
async fn rows_without_batch_action_are_refused() {
    let h = Harness::new();
    h.transport.reply(
        Method::Get,
        "/api/cabinets/",
        Reply::ok(json!([{"id": 1, "name": "101"}])),
    );
    let browser = h.browser::<services::Cabinets>();
    browser.mount().await.unwrap();

    assert!(matches!(
        browser.batch().open_for_row(1).await,
        Err(BatchError::Unsupported)
    ));
    assert!(matches!(
        browser.batch().submit().await,
        Err(BatchError::NotOpen)
    ));
}

fn practice_fixture(h: &Harness, instructors_delay: Delay) {
    h.transport.reply(
        Method::Get,
        "/api/students/paginated",
        Reply::ok(json!([student_row(21, "Orlov", 2, 5)])),
    );
    h.transport.reply(
        Method::Get,
        "/api/category_levels/2/instructors",
        Reply::ok(json!([instructor_row(8, "Smirnov")])).after(instructors_delay),
    );
}

#[tokio::test(start_paused = true)]
async fn early_instructor_pick_is_dropped_when_not_offered() {
    let h = Harness::new();
    practice_fixture(&h, Delay::from_millis(50));
    let browser = h.browser::<Students>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    let (opened, picked) = tokio::join!(batch.open_for_row(21), async {
        tokio::time::sleep(Delay::from_millis(5)).await;
        batch.select_instructor(Some(InstructorId::new(99)))
    });
    opened.unwrap();
    picked.unwrap();

    assert_eq!(batch.draft().unwrap().instructor_id, None);
}

#[tokio::test(start_paused = true)]
async fn early_instructor_pick_survives_when_offered() {
    let h = Harness::new();
    practice_fixture(&h, Delay::from_millis(50));
    let browser = h.browser::<Students>();
    browser.mount().await.unwrap();
    let batch = browser.batch();

    let (opened, picked) = tokio::join!(batch.open_for_row(21), async {
        tokio::time::sleep(Delay::from_millis(5)).await;
        batch.select_instructor(Some(InstructorId::new(8)))
    });
    opened.unwrap();
    picked.unwrap();

    assert_eq!(
        batch.draft().unwrap().instructor_id,
        Some(InstructorId::new(8))
    );
}

#[tokio::test]
async fn submit_refuses_an_instructor_outside_the_offered_list() {
    let h = Harness::new();
    practice_fixture(&h, Delay::ZERO);
    let browser = h.browser::<Students>();
    browser.mount().await.unwrap();
    let batch = browser.batch();
    batch.open_for_row(21).await.unwrap();

    batch.select_instructor(Some(InstructorId::new(99))).unwrap();
    let err = batch.submit().await.unwrap_err();

    assert!(matches!(err, BatchError::Invalid(ScheduleError::MissingInstructor)));
    assert_eq!(batch.draft().unwrap().instructor_id, None);
    assert_eq!(batch.phase(), BatchPhase::Open);
    assert!(
        h.transport
            .requests_to(Method::Post, "/api/practice_schedules/create_butch")
            .is_empty()
    );
}
