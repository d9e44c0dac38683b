//! Account provisioning: registration creates the user row, the immutable
//! physical root directory, and the profile-image file as one logical unit.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use sqlx::postgres::PgPool;
use tracing::info;

use stratus_core::result::AppResult;
use stratus_core::AppError;
use stratus_database::repositories;
use stratus_database::TxScope;
use stratus_entity::user::{CreateUser, User};
use stratus_storage::LocalVault;

use crate::file::{sniff, store_file, Upload};
use crate::support;

/// Data required to register a new account.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// Display name.
    pub username: String,
    /// Unique login email.
    pub email: String,
    /// Plaintext password; hashed before it touches the database.
    pub password: String,
    /// Profile image upload. Must actually be an image by content.
    pub image: Upload,
}

/// Provisions and removes accounts and their physical root directories.
#[derive(Debug, Clone)]
pub struct UserService {
    pool: PgPool,
    vault: Arc<LocalVault>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(pool: PgPool, vault: Arc<LocalVault>) -> Self {
        Self { pool, vault }
    }

    /// Register an account.
    ///
    /// One transaction scope covers the user row, the root-path write, the
    /// profile-image file row, and the image pointer, so they land together
    /// or not at all. The physical root (and the image inside it) is
    /// removed again if any metadata step fails after it was created.
    pub async fn register(&self, req: RegisterUser) -> AppResult<User> {
        let image_name = support::sanitize_file_name(&req.image.name)?.to_string();
        if req.image.data.is_empty() {
            return Err(AppError::validation("Unprovided image"));
        }
        let (mime, _) = sniff(&req.image.data);
        if !mime.as_deref().is_some_and(|m| m.starts_with("image")) {
            return Err(AppError::validation("Invalid image file"));
        }

        let password = hash_password(&req.password)?;
        let record = CreateUser {
            username: req.username,
            email: req.email,
            password,
        };

        let mut scope = TxScope::begin(&self.pool).await?;
        let user = repositories::user::create(scope.conn(), &record).await?;

        let root_path = self
            .vault
            .create_root(user.id)
            .await
            .map_err(support::map_driver_error)?;

        let provisioned = async {
            let user = repositories::user::set_root_path(
                scope.conn(),
                user.id,
                support::path_str(&root_path)?,
            )
            .await?;

            let (image, _path) = store_file(
                scope.conn(),
                &self.vault,
                user.id,
                None,
                &root_path,
                &image_name,
                &req.image.data,
            )
            .await?;

            repositories::user::set_image(scope.conn(), user.id, Some(image.id)).await
        }
        .await;

        let user = match provisioned {
            Ok(user) => user,
            Err(e) => {
                // The root directory exists but the account rows are about
                // to roll back; remove the directory so the failed signup
                // leaves nothing behind.
                self.vault.remove(std::slice::from_ref(&root_path)).await;
                return Err(e);
            }
        };

        let removals = match scope.commit().await {
            Ok(removals) => removals,
            Err(e) => {
                // Same cleanup as a failed metadata write: a commit failure
                // rolls the account rows back, so the root must not survive.
                self.vault.remove(std::slice::from_ref(&root_path)).await;
                return Err(e);
            }
        };
        self.vault.remove(&removals).await;

        info!(user_id = user.id, path = %user.path, "User registered");
        Ok(user)
    }

    /// Verify a login attempt against the stored hash.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = repositories::user::find_by_email(&self.pool, email)
            .await?
            .ok_or_else(|| AppError::authorization("Invalid credentials"))?;
        if !verify_password(password, &user.password)? {
            return Err(AppError::authorization("Invalid credentials"));
        }
        Ok(user)
    }

    /// Delete an account. Folder and file rows cascade with the user row;
    /// the physical root subtree is removed after the commit.
    pub async fn delete_account(&self, user_id: i64) -> AppResult<()> {
        let mut scope = TxScope::begin(&self.pool).await?;
        let user = repositories::user::find_by_id(scope.conn(), user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        repositories::user::delete(scope.conn(), user_id).await?;
        if !user.path.is_empty() {
            scope.defer_removal(&user.path);
        }

        let removals = scope.commit().await?;
        self.vault.remove(&removals).await;

        info!(user_id, "User deleted");
        Ok(())
    }
}

/// Hash a plaintext password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored Argon2id hash.
fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::internal(format!("Stored password hash unreadable: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::internal(format!(
            "Password verification failed: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }
}
