//! Folder operations: create, rename, delete, listings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::postgres::PgPool;
use tracing::info;

use stratus_core::result::AppResult;
use stratus_core::types::Listing;
use stratus_core::AppError;
use stratus_database::repositories;
use stratus_database::TxScope;
use stratus_entity::file::File;
use stratus_entity::folder::{CreateFolder, Folder};
use stratus_storage::LocalVault;

use crate::context::RequestContext;
use crate::support;

/// The direct contents of one folder: child folders plus files.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FolderContents {
    /// Child folders, newest first.
    pub folders: Vec<Folder>,
    /// Files in the folder, newest first.
    pub files: Vec<File>,
}

impl FolderContents {
    /// Whether the folder holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Coordinates folder mutations across the vault and the metadata store.
#[derive(Debug, Clone)]
pub struct FolderService {
    pool: PgPool,
    vault: Arc<LocalVault>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(pool: PgPool, vault: Arc<LocalVault>) -> Self {
        Self { pool, vault }
    }

    /// Create a folder under the user's root (`parent_id` None) or under an
    /// owned parent folder.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        raw_name: &str,
        parent_id: Option<i64>,
    ) -> AppResult<Folder> {
        let name = support::sanitize_folder_name(raw_name)?;

        let mut scope = TxScope::begin(&self.pool).await?;
        let parent_path = support::resolve_parent_path(scope.conn(), ctx, parent_id).await?;
        support::ensure_name_free(scope.conn(), ctx.user_id(), parent_id, name).await?;

        let dir_path = self
            .vault
            .create_dir(&parent_path, name)
            .await
            .map_err(support::map_driver_error)?;

        let record = CreateFolder {
            name: name.to_string(),
            path: support::path_str(&dir_path)?.to_string(),
            user_id: ctx.user_id(),
            parent_id,
        };
        let folder = match repositories::folder::create(scope.conn(), &record).await {
            Ok(folder) => folder,
            Err(e) => {
                // The directory landed on disk but its row did not; remove
                // it so the rejected request leaves no orphan behind.
                self.vault.remove(std::slice::from_ref(&dir_path)).await;
                return Err(e);
            }
        };

        let removals = match scope.commit().await {
            Ok(removals) => removals,
            Err(e) => {
                // A failed commit rolls the row back; the directory must go
                // the same way as on a failed insert.
                self.vault.remove(std::slice::from_ref(&dir_path)).await;
                return Err(e);
            }
        };
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            folder_id = folder.id,
            path = %folder.path,
            "Folder created"
        );
        Ok(folder)
    }

    /// Rename a folder and/or update its flags.
    ///
    /// When the sanitized name equals the stored name the vault is not
    /// touched at all and only the flags are written.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        raw_name: &str,
        is_starred: bool,
        is_public: bool,
    ) -> AppResult<Folder> {
        let name = support::sanitize_folder_name(raw_name)?;

        let mut scope = TxScope::begin(&self.pool).await?;
        let folder = repositories::folder::find_owned(scope.conn(), ctx.user_id(), folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        if folder.name == name {
            let updated = repositories::folder::set_flags(
                scope.conn(),
                ctx.user_id(),
                folder_id,
                is_starred,
                is_public,
            )
            .await?;
            scope.commit().await?;
            return Ok(updated);
        }

        let parent_path =
            support::resolve_holding_path(scope.conn(), ctx, folder.parent_id).await?;
        support::ensure_name_free(scope.conn(), ctx.user_id(), folder.parent_id, name).await?;

        let old_path = PathBuf::from(&folder.path);
        let new_path = self
            .vault
            .rename_dir(&old_path, &parent_path, name)
            .await
            .map_err(support::map_driver_error)?;

        let updated = match repositories::folder::rename(
            scope.conn(),
            ctx.user_id(),
            folder_id,
            name,
            support::path_str(&new_path)?,
            is_starred,
            is_public,
        )
        .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.undo_rename(&new_path, &old_path, &folder.name).await;
                return Err(e);
            }
        };

        let removals = match scope.commit().await {
            Ok(removals) => removals,
            Err(e) => {
                self.undo_rename(&new_path, &old_path, &folder.name).await;
                return Err(e);
            }
        };
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            folder_id,
            from = %folder.name,
            to = %name,
            "Folder renamed"
        );
        Ok(updated)
    }

    /// Delete a folder, all descendant rows (via cascade), and the physical
    /// subtree. The subtree removal runs only after the row deletes commit.
    pub async fn delete(&self, ctx: &RequestContext, folder_id: i64) -> AppResult<()> {
        let mut scope = TxScope::begin(&self.pool).await?;
        let folder = repositories::folder::find_owned(scope.conn(), ctx.user_id(), folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        repositories::folder::delete(scope.conn(), ctx.user_id(), folder_id).await?;
        scope.defer_removal(&folder.path);

        let removals = scope.commit().await?;
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            folder_id,
            path = %folder.path,
            "Folder deleted"
        );
        Ok(())
    }

    /// List all folders the user owns.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Listing<Folder>> {
        let rows = repositories::folder::list(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the user's starred folders.
    pub async fn starred(&self, ctx: &RequestContext) -> AppResult<Listing<Folder>> {
        let rows = repositories::folder::starred(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the user's public folders.
    pub async fn public(&self, ctx: &RequestContext) -> AppResult<Listing<Folder>> {
        let rows = repositories::folder::public_listing(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the direct contents (child folders + files) of an owned folder,
    /// or of the root level when `folder_id` is None.
    pub async fn contents(
        &self,
        ctx: &RequestContext,
        folder_id: Option<i64>,
    ) -> AppResult<FolderContents> {
        if let Some(id) = folder_id {
            repositories::folder::find_owned(&self.pool, ctx.user_id(), id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
        }
        let folders =
            repositories::folder::list_children(&self.pool, ctx.user_id(), folder_id).await?;
        let files =
            repositories::file::list_in_folder(&self.pool, ctx.user_id(), folder_id).await?;
        Ok(FolderContents { folders, files })
    }

    /// Best-effort reversal of a physical rename whose metadata write
    /// failed. If the reversal itself fails the trees have diverged and all
    /// we can do is say so loudly.
    async fn undo_rename(&self, new_path: &Path, old_path: &Path, old_name: &str) {
        if let Some(parent) = old_path.parent() {
            if self.vault.rename_dir(new_path, parent, old_name).await.is_ok() {
                return;
            }
        }
        tracing::error!(
            path = %new_path.display(),
            "Failed to reverse folder rename after metadata failure; trees diverged"
        );
    }
}
