use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{NewTask, Status, Task, UpdateTask};

/// Format accepted for `due_at` input.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

fn check_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parses a user-supplied due date. Blank input means "no due date";
/// anything else must be a calendar date in `YYYY-MM-DD` form.
pub fn parse_due_date(input: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DUE_DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                AppError::Validation(format!("due date must be YYYY-MM-DD, got '{s}'"))
            }),
    }
}

pub async fn add_task(db: &SqlitePool, req: NewTask) -> Result<Task, AppError> {
    check_title(&req.title)?;
    let due_at = parse_due_date(req.due_at.as_deref())?;
    let created_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, priority, status, created_at, due_at, completed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.priority)
    .bind(Status::NotStarted)
    .bind(created_at)
    .bind(due_at)
    .execute(db)
    .await?;

    Ok(Task {
        id: result.last_insert_rowid(),
        title: req.title,
        description: req.description,
        priority: req.priority,
        status: Status::NotStarted,
        created_at,
        due_at,
        completed_at: None,
    })
}

pub async fn fetch_tasks(db: &SqlitePool) -> Result<Vec<Task>, AppError> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, priority, status, created_at, due_at, completed_at
        FROM tasks
        ORDER BY created_at DESC, id ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(tasks)
}

pub async fn find_task_by_id(db: &SqlitePool, id: i64) -> Result<Option<Task>, AppError> {
    let task = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, priority, status, created_at, due_at, completed_at
        FROM tasks
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(task)
}

/// Replaces every mutable field of the record. `completed_at` is recomputed
/// on every call: Completed stamps the current time, any other status clears
/// it, whether or not the status actually changed.
pub async fn update_task(db: &SqlitePool, id: i64, req: UpdateTask) -> Result<Task, AppError> {
    check_title(&req.title)?;
    let due_at = parse_due_date(req.due_at.as_deref())?;

    let current = find_task_by_id(db, id).await?.ok_or(AppError::NotFound)?;

    let completed_at = match req.status {
        Status::Completed => Some(Utc::now()),
        _ => None,
    };

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?1,
            description = ?2,
            priority = ?3,
            status = ?4,
            due_at = ?5,
            completed_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.priority)
    .bind(req.status)
    .bind(due_at)
    .bind(completed_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Task {
        id,
        title: req.title,
        description: req.description,
        priority: req.priority,
        status: req.status,
        created_at: current.created_at,
        due_at,
        completed_at,
    })
}

/// Idempotent: deleting an id that does not exist is a silent success.
pub async fn delete_task(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM tasks WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

/// Case-insensitive substring match on title or description. A blank
/// keyword is the same as `fetch_tasks`.
pub async fn search_tasks(db: &SqlitePool, keyword: &str) -> Result<Vec<Task>, AppError> {
    if keyword.trim().is_empty() {
        return fetch_tasks(db).await;
    }

    let pattern = format!("%{keyword}%");
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, title, description, priority, status, created_at, due_at, completed_at
        FROM tasks
        WHERE title LIKE ?1 OR description LIKE ?1
        ORDER BY created_at DESC, id ASC
        "#,
    )
    .bind(pattern)
    .fetch_all(db)
    .await?;

    Ok(tasks)
}
