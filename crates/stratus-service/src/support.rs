//! Shared coordinator helpers: name sanitization, parent resolution,
//! cross-table collision checks, and driver severity mapping.

use std::path::{Path, PathBuf};

use sqlx::postgres::PgConnection;

use stratus_core::error::{AppError, ErrorKind};
use stratus_core::name;
use stratus_core::result::AppResult;
use stratus_database::repositories;
use stratus_storage::DriverError;

use crate::context::RequestContext;

/// Sanitize a user-supplied folder name: trim, basename check, charset.
pub(crate) fn sanitize_folder_name(raw: &str) -> AppResult<&str> {
    let parsed = name::parse_name(raw)
        .ok_or_else(|| AppError::validation("Invalid folder name"))?;
    if !name::is_folder_name_safe(parsed) {
        return Err(AppError::validation("Unsafe folder name"));
    }
    Ok(parsed)
}

/// Sanitize a user-supplied file name: trim, basename check, charset.
pub(crate) fn sanitize_file_name(raw: &str) -> AppResult<&str> {
    let parsed = name::parse_name(raw)
        .ok_or_else(|| AppError::validation("Invalid file name"))?;
    if !name::is_file_name_safe(parsed) {
        return Err(AppError::validation("Unsafe file name"));
    }
    Ok(parsed)
}

/// Classify a vault failure: recoverable rejections become request errors,
/// anything else means the vault and the metadata store can no longer be
/// assumed to agree.
pub(crate) fn map_driver_error(e: DriverError) -> AppError {
    if e.is_fatal() {
        AppError::with_source(
            ErrorKind::Storage,
            "Filesystem and metadata store are out of sync",
            e,
        )
    } else {
        AppError::conflict(e.to_string())
    }
}

/// Resolve the physical directory a parent folder id refers to: the user's
/// root when `None`, else the owned parent folder's stored path. A
/// referenced parent that does not exist (or belongs to someone else) is a
/// not-found request error.
pub(crate) async fn resolve_parent_path(
    conn: &mut PgConnection,
    ctx: &RequestContext,
    parent_id: Option<i64>,
) -> AppResult<PathBuf> {
    match parent_id {
        None => Ok(PathBuf::from(&ctx.user.path)),
        Some(id) => {
            let parent = repositories::folder::find_owned(&mut *conn, ctx.user_id(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
            Ok(PathBuf::from(parent.path))
        }
    }
}

/// Resolve the physical directory holding an existing entry, given its
/// stored parent id. The foreign keys guarantee the parent row exists, so
/// a miss here is an internal inconsistency, not a caller mistake.
pub(crate) async fn resolve_holding_path(
    conn: &mut PgConnection,
    ctx: &RequestContext,
    parent_id: Option<i64>,
) -> AppResult<PathBuf> {
    match parent_id {
        None => Ok(PathBuf::from(&ctx.user.path)),
        Some(id) => {
            let row = repositories::folder::find_owned(&mut *conn, ctx.user_id(), id)
                .await?
                .ok_or_else(|| {
                    AppError::internal(format!("Parent folder {id} missing for owned entry"))
                })?;
            Ok(PathBuf::from(row.path))
        }
    }
}

/// Verify that no folder *or* file occupies `(user, parent, name)`. Folders
/// and files share one namespace per directory, so either match conflicts.
pub(crate) async fn ensure_name_free(
    conn: &mut PgConnection,
    user_id: i64,
    parent_id: Option<i64>,
    name: &str,
) -> AppResult<()> {
    if repositories::folder::sibling_exists(&mut *conn, user_id, parent_id, name).await? {
        return Err(AppError::conflict("Duplicate folder name"));
    }
    if repositories::file::sibling_exists(&mut *conn, user_id, parent_id, name).await? {
        return Err(AppError::conflict("A file with the same name exists"));
    }
    Ok(())
}

/// Stored paths are produced from UTF-8 config and sanitized names; a
/// non-UTF-8 path can only mean an invariant was broken upstream.
pub(crate) fn path_str(path: &Path) -> AppResult<&str> {
    path.to_str()
        .ok_or_else(|| AppError::internal(format!("Non-UTF-8 vault path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_folder_name() {
        assert_eq!(sanitize_folder_name(" Docs ").unwrap(), "Docs");
        assert!(sanitize_folder_name("a/b").unwrap_err().is_client_error());
        assert!(sanitize_folder_name("..").is_err());
        // Folder names never carry extensions.
        assert!(sanitize_folder_name("notes.txt").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a.png").unwrap(), "a.png");
        assert!(sanitize_file_name("../a.png").is_err());
        assert!(sanitize_file_name("  ").is_err());
    }

    #[test]
    fn test_driver_severity_mapping() {
        let recoverable = map_driver_error(DriverError::Rejected("Folder already exists".into()));
        assert!(recoverable.is_client_error());

        let fatal = map_driver_error(DriverError::Invariant("Invalid computed path".into()));
        assert!(!fatal.is_client_error());
        assert_eq!(fatal.kind, ErrorKind::Storage);
    }
}
