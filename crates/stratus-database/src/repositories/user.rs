//! User repository.

use sqlx::PgExecutor;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_entity::user::{CreateUser, User};

/// Insert a new user row. The root path starts empty and is persisted once
/// the physical root directory exists.
pub async fn create<'e>(db: impl PgExecutor<'e>, data: &CreateUser) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&data.username)
    .bind(&data.email)
    .bind(&data.password)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
            AppError::conflict(format!("Email '{}' is already registered", data.email))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
    })
}

/// Find a user by id.
pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: i64) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
}

/// Find a user by login email.
pub async fn find_by_email<'e>(db: impl PgExecutor<'e>, email: &str) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by email", e))
}

/// Persist the root directory path. Written exactly once at registration.
pub async fn set_root_path<'e>(db: impl PgExecutor<'e>, id: i64, path: &str) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET path = $2, updated_at = NOW() WHERE id = $1 AND path = '' RETURNING *",
    )
    .bind(id)
    .bind(path)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set root path", e))?
    .ok_or_else(|| AppError::internal(format!("Root path for user {id} already set or user missing")))
}

/// Point the profile image at a file row (or clear it).
pub async fn set_image<'e>(
    db: impl PgExecutor<'e>,
    id: i64,
    image_id: Option<i64>,
) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET image_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(image_id)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set profile image", e))?
    .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

/// Delete a user row. Folder and file rows cascade via foreign keys; the
/// physical root removal is the coordinator's post-commit responsibility.
pub async fn delete<'e>(db: impl PgExecutor<'e>, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;
    Ok(result.rows_affected() > 0)
}
