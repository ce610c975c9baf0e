/// Login session model
///
/// A row exists for every live login. The client holds a signed token naming
/// a random session identifier; only the SHA-256 of that identifier is stored
/// here, so a leaked database does not yield usable cookies. Logging out
/// deletes the row, which revokes the token even though its signature and
/// expiry are still valid.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE session (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     user_id INTEGER NOT NULL REFERENCES user(id),
///     created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     expires_at INTEGER NOT NULL -- unix seconds
/// );
/// ```

use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: i64,

    /// Hex SHA-256 of the session identifier
    pub token_hash: String,

    pub user_id: i64,
    pub created_at: NaiveDateTime,

    /// Expiry as unix seconds
    pub expires_at: i64,
}

impl Session {
    /// Records a new session
    pub async fn create(
        pool: &SqlitePool,
        user_id: i64,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO session (token_hash, user_id, expires_at)
            VALUES (?, ?, ?)
            RETURNING id, token_hash, user_id, created_at, expires_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Finds an unexpired session by token hash
    pub async fn find_active(
        pool: &SqlitePool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, token_hash, user_id, created_at, expires_at
            FROM session
            WHERE token_hash = ? AND expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(Utc::now().timestamp())
        .fetch_optional(pool)
        .await
    }

    /// Ends a session
    ///
    /// Returns `false` if there was nothing to delete.
    pub async fn delete_by_token_hash(
        pool: &SqlitePool,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM session WHERE token_hash = ?")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every expired session, returning how many were dropped
    pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(pool)
            .await?;

        let purged = result.rows_affected();
        debug!(purged, "Purged expired sessions");
        Ok(purged)
    }
}
