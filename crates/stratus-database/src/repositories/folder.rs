//! Folder repository.

use sqlx::PgExecutor;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_entity::folder::{CreateFolder, Folder};

/// Find a folder by id, scoped to its owner.
pub async fn find_owned<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    id: i64,
) -> AppResult<Option<Folder>> {
    sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
}

/// Whether a sibling folder already occupies `(user_id, parent_id, name)`.
pub async fn sibling_exists<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    parent_id: Option<i64>,
    name: &str,
) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS( \
            SELECT 1 FROM folders \
            WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND name = $3 \
         )",
    )
    .bind(user_id)
    .bind(parent_id)
    .bind(name)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check folder sibling", e))
}

/// List all folders owned by a user, newest first.
pub async fn list<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
}

/// List the direct child folders of a parent (None for the root level).
pub async fn list_children<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    parent_id: Option<i64>,
) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders \
         WHERE user_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .bind(parent_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list child folders", e))
}

/// List a user's starred folders.
pub async fn starred<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders WHERE user_id = $1 AND is_starred ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list starred folders", e))
}

/// List a user's public folders.
pub async fn public_listing<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders WHERE user_id = $1 AND is_public ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list public folders", e))
}

/// Keyset-paginated name search. Own mode scopes to the acting user; global
/// mode inverts the filter and only sees public folders of other users.
pub async fn search<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    patterns: &[String],
    global: bool,
    last_id: Option<i64>,
    limit: i64,
) -> AppResult<Vec<Folder>> {
    let sql = if global {
        "SELECT * FROM folders \
         WHERE user_id <> $1 AND is_public AND name ILIKE ANY($2) \
           AND ($3::BIGINT IS NULL OR id < $3) \
         ORDER BY created_at DESC LIMIT $4"
    } else {
        "SELECT * FROM folders \
         WHERE user_id = $1 AND name ILIKE ANY($2) \
           AND ($3::BIGINT IS NULL OR id < $3) \
         ORDER BY created_at DESC LIMIT $4"
    };
    sqlx::query_as::<_, Folder>(sql)
        .bind(user_id)
        .bind(patterns)
        .bind(last_id)
        .bind(limit)
        .fetch_all(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search folders", e))
}

/// Insert a new folder row.
pub async fn create<'e>(db: impl PgExecutor<'e>, data: &CreateFolder) -> AppResult<Folder> {
    sqlx::query_as::<_, Folder>(
        "INSERT INTO folders (name, path, user_id, parent_id) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&data.name)
    .bind(&data.path)
    .bind(data.user_id)
    .bind(data.parent_id)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("folders_sibling_name_key") =>
        {
            AppError::conflict(format!("Folder '{}' already exists here", data.name))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create folder", e),
    })
}

/// Update name, path, and flags after a successful vault rename.
pub async fn rename<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    id: i64,
    name: &str,
    path: &str,
    is_starred: bool,
    is_public: bool,
) -> AppResult<Folder> {
    sqlx::query_as::<_, Folder>(
        "UPDATE folders \
         SET name = $3, path = $4, is_starred = $5, is_public = $6, updated_at = NOW() \
         WHERE user_id = $1 AND id = $2 RETURNING *",
    )
    .bind(user_id)
    .bind(id)
    .bind(name)
    .bind(path)
    .bind(is_starred)
    .bind(is_public)
    .fetch_optional(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("folders_sibling_name_key") =>
        {
            AppError::conflict(format!("Folder '{name}' already exists here"))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to rename folder", e),
    })?
    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
}

/// Update only the star/public flags.
pub async fn set_flags<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    id: i64,
    is_starred: bool,
    is_public: bool,
) -> AppResult<Folder> {
    sqlx::query_as::<_, Folder>(
        "UPDATE folders SET is_starred = $3, is_public = $4, updated_at = NOW() \
         WHERE user_id = $1 AND id = $2 RETURNING *",
    )
    .bind(user_id)
    .bind(id)
    .bind(is_starred)
    .bind(is_public)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder flags", e))?
    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
}

/// Delete a folder row. Descendant folder and file rows cascade via the
/// foreign keys; the physical subtree removal is the coordinator's
/// post-commit responsibility.
pub async fn delete<'e>(db: impl PgExecutor<'e>, user_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM folders WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folder", e))?;
    Ok(result.rows_affected() > 0)
}
