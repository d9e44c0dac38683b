//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A folder in a user's directory tree.
///
/// `(user_id, parent_id, name)` is unique across sibling folders, and the
/// same name must also be free among sibling files: folders and files share
/// one namespace per directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: i64,
    /// Folder name (sanitized, equals the on-disk directory name).
    pub name: String,
    /// User-local star flag.
    pub is_starred: bool,
    /// Whether the folder is visible in global search.
    pub is_public: bool,
    /// Absolute directory path. Always the verbatim path returned by the
    /// vault for the last create/rename, never computed independently.
    pub path: String,
    /// The folder owner. Immutable.
    pub user_id: i64,
    /// Parent folder (None for root-level folders).
    pub parent_id: Option<i64>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new folder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Sanitized folder name.
    pub name: String,
    /// Absolute path returned by the vault.
    pub path: String,
    /// The folder owner.
    pub user_id: i64,
    /// Parent folder (None for root-level).
    pub parent_id: Option<i64>,
}
