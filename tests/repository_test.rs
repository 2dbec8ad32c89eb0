use chrono::Utc;
use sqlx::SqlitePool;

use taskdeck::db::{self, repository};
use taskdeck::error::AppError;
use taskdeck::models::{NewTask, Priority, Status, UpdateTask};

async fn setup() -> SqlitePool {
    // db::connect caps the pool at one connection, which keeps the whole
    // test on a single in-memory database.
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::init(&pool).await.expect("Failed to create schema");
    pool
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..Default::default()
    }
}

fn update_from(title: &str, status: Status) -> UpdateTask {
    UpdateTask {
        title: title.to_string(),
        description: String::new(),
        priority: Priority::Medium,
        status,
        due_at: None,
    }
}

#[tokio::test]
async fn add_defaults_to_not_started_with_no_completion() {
    let pool = setup().await;

    let task = repository::add_task(&pool, new_task("write tests"))
        .await
        .expect("add failed");

    assert_eq!(task.status, Status::NotStarted);
    assert_eq!(task.priority, Priority::Medium);
    assert!(task.completed_at.is_none());
    assert!(task.due_at.is_none());
    assert_eq!(task.description, "");
}

#[tokio::test]
async fn add_round_trip_preserves_fields() {
    let pool = setup().await;

    let before = Utc::now();
    let added = repository::add_task(
        &pool,
        NewTask {
            title: "Buy milk".to_string(),
            description: "two liters".to_string(),
            priority: Priority::High,
            due_at: Some("2025-01-10".to_string()),
        },
    )
    .await
    .expect("add failed");

    let found = repository::find_task_by_id(&pool, added.id)
        .await
        .expect("lookup failed")
        .expect("task missing");

    assert_eq!(found.id, added.id);
    assert_eq!(found.title, "Buy milk");
    assert_eq!(found.description, "two liters");
    assert_eq!(found.priority, Priority::High);
    assert_eq!(found.status, Status::NotStarted);
    assert_eq!(
        found.due_at.map(|d| d.to_string()),
        Some("2025-01-10".to_string())
    );
    assert!(found.created_at >= before);
    assert!(found.completed_at.is_none());
}

#[tokio::test]
async fn add_rejects_blank_title() {
    let pool = setup().await;

    for title in ["", "   ", "\t\n"] {
        let err = repository::add_task(&pool, new_task(title))
            .await
            .expect_err("blank title should be rejected");
        assert!(matches!(err, AppError::Validation(_)));
    }

    let tasks = repository::fetch_tasks(&pool).await.expect("fetch failed");
    assert!(tasks.is_empty(), "no row should have been created");
}

#[tokio::test]
async fn add_rejects_malformed_due_date() {
    let pool = setup().await;

    let err = repository::add_task(
        &pool,
        NewTask {
            title: "has a bad date".to_string(),
            due_at: Some("not-a-date".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect_err("malformed date should be rejected");
    assert!(matches!(err, AppError::Validation(_)));

    let tasks = repository::fetch_tasks(&pool).await.expect("fetch failed");
    assert!(tasks.is_empty(), "no row should have been created");
}

#[tokio::test]
async fn find_returns_none_for_unknown_id() {
    let pool = setup().await;

    let found = repository::find_task_by_id(&pool, 12345)
        .await
        .expect("lookup failed");
    assert!(found.is_none());
}

#[tokio::test]
async fn update_to_completed_stamps_completion_time() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("finish report"))
        .await
        .expect("add failed");

    let before = Utc::now();
    let updated = repository::update_task(&pool, task.id, update_from("finish report", Status::Completed))
        .await
        .expect("update failed");

    assert_eq!(updated.status, Status::Completed);
    let done = updated.completed_at.expect("completed_at should be set");
    assert!(done >= before);

    let stored = repository::find_task_by_id(&pool, task.id)
        .await
        .expect("lookup failed")
        .expect("task missing");
    assert_eq!(stored.completed_at, updated.completed_at);
}

#[tokio::test]
async fn update_away_from_completed_clears_completion_time() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("laundry"))
        .await
        .expect("add failed");

    repository::update_task(&pool, task.id, update_from("laundry", Status::Completed))
        .await
        .expect("update failed");
    let updated = repository::update_task(&pool, task.id, update_from("laundry", Status::InProgress))
        .await
        .expect("update failed");

    assert_eq!(updated.status, Status::InProgress);
    assert!(updated.completed_at.is_none());

    let stored = repository::find_task_by_id(&pool, task.id)
        .await
        .expect("lookup failed")
        .expect("task missing");
    assert!(stored.completed_at.is_none());
}

#[tokio::test]
async fn update_restamps_completion_even_without_status_change() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("water plants"))
        .await
        .expect("add failed");

    let first = repository::update_task(&pool, task.id, update_from("water plants", Status::Completed))
        .await
        .expect("update failed")
        .completed_at
        .expect("completed_at should be set");

    let second = repository::update_task(&pool, task.id, update_from("water plants", Status::Completed))
        .await
        .expect("update failed")
        .completed_at
        .expect("completed_at should be set");

    assert!(second >= first, "every update recomputes the stamp");
}

#[tokio::test]
async fn update_replaces_all_mutable_fields_and_keeps_created_at() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("draft email"))
        .await
        .expect("add failed");

    let updated = repository::update_task(
        &pool,
        task.id,
        UpdateTask {
            title: "send email".to_string(),
            description: "to the whole team".to_string(),
            priority: Priority::Low,
            status: Status::InProgress,
            due_at: Some("2026-03-01".to_string()),
        },
    )
    .await
    .expect("update failed");

    assert_eq!(updated.title, "send email");
    assert_eq!(updated.description, "to the whole team");
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(
        updated.due_at.map(|d| d.to_string()),
        Some("2026-03-01".to_string())
    );
    assert_eq!(updated.created_at, task.created_at);

    let stored = repository::find_task_by_id(&pool, task.id)
        .await
        .expect("lookup failed")
        .expect("task missing");
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn update_rejects_blank_title_and_leaves_row_untouched() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("original title"))
        .await
        .expect("add failed");

    let err = repository::update_task(&pool, task.id, update_from("  ", Status::InProgress))
        .await
        .expect_err("blank title should be rejected");
    assert!(matches!(err, AppError::Validation(_)));

    let stored = repository::find_task_by_id(&pool, task.id)
        .await
        .expect("lookup failed")
        .expect("task missing");
    assert_eq!(stored.title, "original title");
    assert_eq!(stored.status, Status::NotStarted);
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let pool = setup().await;

    let err = repository::update_task(&pool, 999, update_from("ghost", Status::NotStarted))
        .await
        .expect_err("unknown id should fail");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn delete_removes_the_row() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("temporary"))
        .await
        .expect("add failed");

    repository::delete_task(&pool, task.id)
        .await
        .expect("delete failed");

    let found = repository::find_task_by_id(&pool, task.id)
        .await
        .expect("lookup failed");
    assert!(found.is_none());
}

#[tokio::test]
async fn delete_unknown_id_is_a_silent_success() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("survivor"))
        .await
        .expect("add failed");

    repository::delete_task(&pool, 424242)
        .await
        .expect("deleting an absent id must succeed");

    let tasks = repository::fetch_tasks(&pool).await.expect("fetch failed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
}

#[tokio::test]
async fn delete_twice_is_idempotent() {
    let pool = setup().await;
    let task = repository::add_task(&pool, new_task("once"))
        .await
        .expect("add failed");

    repository::delete_task(&pool, task.id)
        .await
        .expect("first delete failed");
    repository::delete_task(&pool, task.id)
        .await
        .expect("second delete must also succeed");
}

#[tokio::test]
async fn init_is_idempotent_and_preserves_rows() {
    let pool = setup().await;
    repository::add_task(&pool, new_task("keep me"))
        .await
        .expect("add failed");

    db::init(&pool).await.expect("re-init failed");

    let tasks = repository::fetch_tasks(&pool).await.expect("fetch failed");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "keep me");
}
