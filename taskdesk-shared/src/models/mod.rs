/// Database models for TaskDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `task`: Personal to-do items, always scoped to their owner
/// - `session`: Server-side login sessions referenced by the session cookie
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::user::{User, CreateUser};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod session;
pub mod task;
pub mod user;

/// Fresh migrated database in a temporary directory, for model tests
#[cfg(test)]
pub(crate) async fn test_pool() -> (tempfile::TempDir, sqlx::SqlitePool) {
    use crate::db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    };

    let dir = tempfile::tempdir().expect("tempdir");
    let pool = create_pool(DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("models.db").display()),
        ..Default::default()
    })
    .await
    .expect("pool");
    run_migrations(&pool).await.expect("migrations");

    (dir, pool)
}

#[cfg(test)]
pub(crate) async fn test_user(pool: &sqlx::SqlitePool, username: &str) -> user::User {
    user::User::create(
        pool,
        user::CreateUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .expect("create user")
}
