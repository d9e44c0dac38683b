//! File repository.

use sqlx::PgExecutor;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::result::AppResult;
use stratus_entity::file::{CreateFile, File};

/// Find a file by id, scoped to its owner.
pub async fn find_owned<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    id: i64,
) -> AppResult<Option<File>> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
}

/// Whether a sibling file already occupies `(user_id, folder_id, name)`.
pub async fn sibling_exists<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    folder_id: Option<i64>,
    name: &str,
) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS( \
            SELECT 1 FROM files \
            WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2 AND name = $3 \
         )",
    )
    .bind(user_id)
    .bind(folder_id)
    .bind(name)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check file sibling", e))
}

/// List all files owned by a user, newest first.
pub async fn list<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
}

/// List the files directly inside a folder (None for the root level).
pub async fn list_in_folder<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    folder_id: Option<i64>,
) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files \
         WHERE user_id = $1 AND folder_id IS NOT DISTINCT FROM $2 \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .bind(folder_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder files", e))
}

/// List a user's starred files.
pub async fn starred<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files WHERE user_id = $1 AND is_starred ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list starred files", e))
}

/// List a user's public files.
pub async fn public_listing<'e>(db: impl PgExecutor<'e>, user_id: i64) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files WHERE user_id = $1 AND is_public ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list public files", e))
}

/// List a user's most recently created files.
pub async fn recent<'e>(db: impl PgExecutor<'e>, user_id: i64, limit: i64) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list recent files", e))
}

/// Keyset-paginated name search, same owner-vs-global semantics as the
/// folder variant.
pub async fn search<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    patterns: &[String],
    global: bool,
    last_id: Option<i64>,
    limit: i64,
) -> AppResult<Vec<File>> {
    let sql = if global {
        "SELECT * FROM files \
         WHERE user_id <> $1 AND is_public AND name ILIKE ANY($2) \
           AND ($3::BIGINT IS NULL OR id < $3) \
         ORDER BY created_at DESC LIMIT $4"
    } else {
        "SELECT * FROM files \
         WHERE user_id = $1 AND name ILIKE ANY($2) \
           AND ($3::BIGINT IS NULL OR id < $3) \
         ORDER BY created_at DESC LIMIT $4"
    };
    sqlx::query_as::<_, File>(sql)
        .bind(user_id)
        .bind(patterns)
        .bind(last_id)
        .bind(limit)
        .fetch_all(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search files", e))
}

/// Insert a new file row.
pub async fn create<'e>(db: impl PgExecutor<'e>, data: &CreateFile) -> AppResult<File> {
    sqlx::query_as::<_, File>(
        "INSERT INTO files (name, mime, kind, path, user_id, folder_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&data.name)
    .bind(&data.mime)
    .bind(data.kind)
    .bind(&data.path)
    .bind(data.user_id)
    .bind(data.folder_id)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("files_sibling_name_key") =>
        {
            AppError::conflict(format!("File '{}' already exists here", data.name))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
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
) -> AppResult<File> {
    sqlx::query_as::<_, File>(
        "UPDATE files \
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
            if db_err.constraint() == Some("files_sibling_name_key") =>
        {
            AppError::conflict(format!("File '{name}' already exists here"))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to rename file", e),
    })?
    .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
}

/// Update only the star/public flags.
pub async fn set_flags<'e>(
    db: impl PgExecutor<'e>,
    user_id: i64,
    id: i64,
    is_starred: bool,
    is_public: bool,
) -> AppResult<File> {
    sqlx::query_as::<_, File>(
        "UPDATE files SET is_starred = $3, is_public = $4, updated_at = NOW() \
         WHERE user_id = $1 AND id = $2 RETURNING *",
    )
    .bind(user_id)
    .bind(id)
    .bind(is_starred)
    .bind(is_public)
    .fetch_optional(db)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file flags", e))?
    .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
}

/// Delete a file row. The physical removal is the coordinator's post-commit
/// responsibility.
pub async fn delete<'e>(db: impl PgExecutor<'e>, user_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM files WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
    Ok(result.rows_affected() > 0)
}
