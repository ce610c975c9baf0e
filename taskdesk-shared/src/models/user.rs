/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     username VARCHAR(80) NOT NULL UNIQUE,
///     password VARCHAR(256) NOT NULL,
///     created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::user::{User, CreateUser};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = User::find_by_username(&pool, "alice").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::SqlitePool;

/// Maximum username length, mirrored by the column definition
pub const MAX_USERNAME_LEN: usize = 80;

/// A registered account
///
/// The password column holds an Argon2id PHC string, never plaintext, and is
/// skipped when the record is serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Unique login name
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,

    /// When the account was created (UTC)
    pub created_at: NaiveDateTime,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint database error if the username is taken.
    pub async fn create(pool: &SqlitePool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO user (username, password)
            VALUES (?, ?)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await
    }

    /// Loads a user by ID
    ///
    /// Called on every authenticated request to turn the session's user id
    /// back into a full record.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at FROM user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by exact username
    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at FROM user WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Counts registered users
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user")
            .fetch_one(pool)
            .await
    }
}
