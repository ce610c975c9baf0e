/// Task model and database operations
///
/// Every query in this module is scoped to an owning user. A task that exists
/// but belongs to someone else is indistinguishable from one that does not
/// exist: lookups return `None` and mutations report `false`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     title VARCHAR(200) NOT NULL,
///     notes TEXT,
///     priority VARCHAR(20) NOT NULL,
///     category VARCHAR(100),
///     due_date DATETIME,
///     attachment_filename VARCHAR(300),
///     is_complete BOOLEAN NOT NULL DEFAULT 0,
///     user_id INTEGER NOT NULL REFERENCES user(id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::task::{Task, CreateTask};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool, owner: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id: owner,
///     title: "Pay rent".to_string(),
///     priority: "high".to_string(),
///     notes: None,
///     category: Some("home".to_string()),
///     due_date: None,
///     attachment_filename: None,
/// }).await?;
///
/// Task::toggle_complete(&pool, owner, task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::SqlitePool;

/// Maximum title length, mirrored by the column definition
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum category length, mirrored by the column definition
pub const MAX_CATEGORY_LEN: usize = 100;

const TASK_COLUMNS: &str =
    "id, title, notes, priority, category, due_date, attachment_filename, is_complete, user_id";

/// Canonical task priorities
///
/// The `priority` column is free text; these are the values the stats
/// endpoint counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// A to-do item
///
/// Serializes to the JSON shape returned by `GET /api/tasks`; the owner id is
/// omitted and `due_date` is rendered as ISO-8601 or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub priority: String,
    pub category: Option<String>,

    #[serde(with = "crate::timefmt::option_iso")]
    pub due_date: Option<NaiveDateTime>,

    pub is_complete: bool,
    pub attachment_filename: Option<String>,

    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user
    pub user_id: i64,
    pub title: String,
    pub priority: String,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDateTime>,

    /// Sanitized name of an already stored attachment
    pub attachment_filename: Option<String>,
}

/// Partial update applied by [`Task::edit`]
///
/// `None` leaves a column untouched. For `notes` and `category`,
/// `Some(None)` clears the column. `due_date` is always written: an edit
/// that does not carry a due date clears it.
#[derive(Debug, Clone, Default)]
pub struct EditTask {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub due_date: Option<NaiveDateTime>,
}

/// Per-user counters for the dashboard
///
/// `high`, `medium` and `low` count incomplete tasks only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl Task {
    /// Creates a new, incomplete task
    pub async fn create(pool: &SqlitePool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO task (title, notes, priority, category, due_date, attachment_filename, user_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(data.title)
            .bind(data.notes)
            .bind(data.priority)
            .bind(data.category)
            .bind(data.due_date)
            .bind(data.attachment_filename)
            .bind(data.user_id)
            .fetch_one(pool)
            .await
    }

    /// Lists a user's tasks in creation order
    pub async fn list_by_owner(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM task WHERE user_id = ? ORDER BY id");

        sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Finds a task by ID, only if `user_id` owns it
    pub async fn find_by_id_and_owner(
        pool: &SqlitePool,
        user_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM task WHERE id = ? AND user_id = ?");

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Finds the owner's task carrying the given attachment
    ///
    /// This is the only access check for attachment downloads.
    pub async fn find_by_attachment(
        pool: &SqlitePool,
        user_id: i64,
        filename: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE user_id = ? AND attachment_filename = ? \
             ORDER BY id LIMIT 1"
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(filename)
            .fetch_optional(pool)
            .await
    }

    /// Flips `is_complete`
    ///
    /// Returns `false` if no task with this ID belongs to `user_id`.
    pub async fn toggle_complete(
        pool: &SqlitePool,
        user_id: i64,
        id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE task SET is_complete = NOT is_complete WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies a partial edit in a single statement
    ///
    /// Returns `false` if no task with this ID belongs to `user_id`.
    pub async fn edit(
        pool: &SqlitePool,
        user_id: i64,
        id: i64,
        data: EditTask,
    ) -> Result<bool, sqlx::Error> {
        let set_notes = data.notes.is_some();
        let set_category = data.category.is_some();

        let result = sqlx::query(
            r#"
            UPDATE task SET
                title = COALESCE(?, title),
                priority = COALESCE(?, priority),
                notes = CASE WHEN ? THEN ? ELSE notes END,
                category = CASE WHEN ? THEN ? ELSE category END,
                due_date = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(data.title)
        .bind(data.priority)
        .bind(set_notes)
        .bind(data.notes.flatten())
        .bind(set_category)
        .bind(data.category.flatten())
        .bind(data.due_date)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a task
    ///
    /// Returns `false` if no task with this ID belongs to `user_id`. The
    /// attachment file, if any, stays on disk.
    pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a user's tasks
    pub async fn stats(pool: &SqlitePool, user_id: i64) -> Result<TaskStats, sqlx::Error> {
        sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN is_complete THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN NOT is_complete AND priority = ? THEN 1 ELSE 0 END), 0) AS high,
                COALESCE(SUM(CASE WHEN NOT is_complete AND priority = ? THEN 1 ELSE 0 END), 0) AS medium,
                COALESCE(SUM(CASE WHEN NOT is_complete AND priority = ? THEN 1 ELSE 0 END), 0) AS low
            FROM task
            WHERE user_id = ?
            "#,
        )
        .bind(Priority::High.as_str())
        .bind(Priority::Medium.as_str())
        .bind(Priority::Low.as_str())
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
