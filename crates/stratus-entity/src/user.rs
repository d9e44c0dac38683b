//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account owning one immutable root directory in the vault.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier. Also names the root directory on disk.
    pub id: i64,
    /// Display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash. Never serialized outward.
    #[serde(skip_serializing)]
    pub password: String,
    /// The file serving as the profile image, if one is set. A referenced
    /// file is protected from deletion.
    pub image_id: Option<i64>,
    /// Absolute path of the user's root directory. Written once at
    /// registration and immutable afterwards.
    pub path: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash.
    pub password: String,
}
