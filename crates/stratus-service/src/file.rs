//! File operations: upload, rename, flags, delete, read, listings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use sqlx::postgres::{PgConnection, PgPool};
use tracing::info;

use stratus_core::result::AppResult;
use stratus_core::types::Listing;
use stratus_core::AppError;
use stratus_database::repositories;
use stratus_database::TxScope;
use stratus_entity::file::{CreateFile, File, FileKind};
use stratus_storage::LocalVault;

use crate::context::RequestContext;
use crate::support;

/// One uploaded file: its original (unsanitized) name and raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original file name as supplied by the uploader.
    pub name: String,
    /// Full file contents.
    pub data: Bytes,
}

/// Sniff the MIME type from content and classify it. The filename plays no
/// part here, so a renamed executable still classifies by what it is.
pub(crate) fn sniff(data: &Bytes) -> (Option<String>, FileKind) {
    let mime = infer::get(data).map(|t| t.mime_type().to_string());
    let kind = FileKind::from_mime(mime.as_deref());
    (mime, kind)
}

/// Store one file: collision check, vault write, metadata row — in that
/// order, with the row's `path` taken verbatim from the vault result. If
/// the row insert fails the just-written physical file is removed before
/// the error propagates.
pub(crate) async fn store_file(
    conn: &mut PgConnection,
    vault: &LocalVault,
    user_id: i64,
    folder_id: Option<i64>,
    parent_path: &Path,
    name: &str,
    data: &Bytes,
) -> AppResult<(File, PathBuf)> {
    support::ensure_name_free(conn, user_id, folder_id, name).await?;

    let (mime, kind) = sniff(data);
    let file_path = vault
        .create_file(parent_path, name, data)
        .await
        .map_err(support::map_driver_error)?;

    let record = CreateFile {
        name: name.to_string(),
        mime,
        kind,
        path: support::path_str(&file_path)?.to_string(),
        user_id,
        folder_id,
    };
    match repositories::file::create(&mut *conn, &record).await {
        Ok(file) => Ok((file, file_path)),
        Err(e) => {
            vault.remove(std::slice::from_ref(&file_path)).await;
            Err(e)
        }
    }
}

/// Coordinates file mutations across the vault and the metadata store.
#[derive(Debug, Clone)]
pub struct FileService {
    pool: PgPool,
    vault: Arc<LocalVault>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(pool: PgPool, vault: Arc<LocalVault>) -> Self {
        Self { pool, vault }
    }

    /// Upload one or more files into an owned folder (or the root level).
    ///
    /// The whole batch shares one transaction scope: if any file fails, the
    /// metadata rolls back and every physical file this request already
    /// created is removed again.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: Option<i64>,
        uploads: Vec<Upload>,
    ) -> AppResult<Vec<File>> {
        let uploads: Vec<Upload> = uploads
            .into_iter()
            .filter(|u| !u.data.is_empty())
            .collect();
        if uploads.is_empty() {
            return Err(AppError::validation("Unprovided file"));
        }

        let mut names = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            names.push(support::sanitize_file_name(&upload.name)?.to_string());
        }

        let mut scope = TxScope::begin(&self.pool).await?;
        let parent_path = support::resolve_parent_path(scope.conn(), ctx, folder_id).await?;

        let mut files = Vec::with_capacity(uploads.len());
        let mut created_paths: Vec<PathBuf> = Vec::with_capacity(uploads.len());
        for (upload, name) in uploads.iter().zip(&names) {
            match store_file(
                scope.conn(),
                &self.vault,
                ctx.user_id(),
                folder_id,
                &parent_path,
                name,
                &upload.data,
            )
            .await
            {
                Ok((file, path)) => {
                    files.push(file);
                    created_paths.push(path);
                }
                Err(e) => {
                    // Earlier files in the batch already hit the disk but
                    // their rows are about to roll back with the scope.
                    self.vault.remove(&created_paths).await;
                    return Err(e);
                }
            }
        }

        let removals = match scope.commit().await {
            Ok(removals) => removals,
            Err(e) => {
                // A failed commit rolls back every row in the batch; the
                // physical files must go the same way.
                self.vault.remove(&created_paths).await;
                return Err(e);
            }
        };
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            count = files.len(),
            "Files uploaded"
        );
        Ok(files)
    }

    /// Rename a file and/or update its flags. Same fast path as folder
    /// rename: an unchanged sanitized name skips the vault entirely.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        raw_name: &str,
        is_starred: bool,
        is_public: bool,
    ) -> AppResult<File> {
        let name = support::sanitize_file_name(raw_name)?;

        let mut scope = TxScope::begin(&self.pool).await?;
        let file = repositories::file::find_owned(scope.conn(), ctx.user_id(), file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        if file.name == name {
            let updated = repositories::file::set_flags(
                scope.conn(),
                ctx.user_id(),
                file_id,
                is_starred,
                is_public,
            )
            .await?;
            scope.commit().await?;
            return Ok(updated);
        }

        let parent_path = support::resolve_holding_path(scope.conn(), ctx, file.folder_id).await?;
        support::ensure_name_free(scope.conn(), ctx.user_id(), file.folder_id, name).await?;

        let old_path = PathBuf::from(&file.path);
        let new_path = self
            .vault
            .rename_file(&old_path, &parent_path, name)
            .await
            .map_err(support::map_driver_error)?;

        let updated = match repositories::file::rename(
            scope.conn(),
            ctx.user_id(),
            file_id,
            name,
            support::path_str(&new_path)?,
            is_starred,
            is_public,
        )
        .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.undo_rename(&new_path, &old_path, &file.name).await;
                return Err(e);
            }
        };

        let removals = match scope.commit().await {
            Ok(removals) => removals,
            Err(e) => {
                self.undo_rename(&new_path, &old_path, &file.name).await;
                return Err(e);
            }
        };
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            file_id,
            from = %file.name,
            to = %name,
            "File renamed"
        );
        Ok(updated)
    }

    /// Update the star/public flags without touching name or path.
    /// Submitting the current values unchanged is an error, mirroring the
    /// mutation contract: every accepted request changes something.
    pub async fn set_flags(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        is_starred: Option<bool>,
        is_public: Option<bool>,
    ) -> AppResult<File> {
        let mut scope = TxScope::begin(&self.pool).await?;
        let file = repositories::file::find_owned(scope.conn(), ctx.user_id(), file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        let is_starred = is_starred.unwrap_or(file.is_starred);
        let is_public = is_public.unwrap_or(file.is_public);
        if is_starred == file.is_starred && is_public == file.is_public {
            scope.rollback().await?;
            return Err(AppError::validation("Nothing changed"));
        }

        let updated =
            repositories::file::set_flags(scope.conn(), ctx.user_id(), file_id, is_starred, is_public)
                .await?;
        scope.commit().await?;
        Ok(updated)
    }

    /// Delete a file row and its physical bytes, two-phase. A file serving
    /// as the owner's profile image is protected while referenced.
    pub async fn delete(&self, ctx: &RequestContext, file_id: i64) -> AppResult<()> {
        let mut scope = TxScope::begin(&self.pool).await?;
        let file = repositories::file::find_owned(scope.conn(), ctx.user_id(), file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        // Re-read the user inside the transaction: the context snapshot may
        // predate a profile-image change.
        let user = repositories::user::find_by_id(scope.conn(), ctx.user_id())
            .await?
            .ok_or_else(|| AppError::internal("Acting user row missing"))?;
        if user.image_id == Some(file.id) {
            scope.rollback().await?;
            return Err(AppError::authorization(
                "This file is the profile picture; change it before removing the file",
            ));
        }

        repositories::file::delete(scope.conn(), ctx.user_id(), file_id).await?;
        scope.defer_removal(&file.path);

        let removals = scope.commit().await?;
        self.vault.remove(&removals).await;

        info!(
            user_id = ctx.user_id(),
            file_id,
            path = %file.path,
            "File deleted"
        );
        Ok(())
    }

    /// Read a file's bytes for download, along with its row (for the MIME
    /// type). A row whose physical bytes are missing means the trees have
    /// diverged, which is a server fault, not a caller mistake.
    pub async fn read(&self, ctx: &RequestContext, file_id: i64) -> AppResult<(File, Bytes)> {
        let file = repositories::file::find_owned(&self.pool, ctx.user_id(), file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        let data = self
            .vault
            .read_file(Path::new(&file.path))
            .await
            .map_err(|e| {
                AppError::with_source(
                    stratus_core::error::ErrorKind::Storage,
                    format!("Stored file unreadable: {}", file.path),
                    e,
                )
            })?;
        Ok((file, data))
    }

    /// List all files the user owns.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Listing<File>> {
        let rows = repositories::file::list(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the user's starred files.
    pub async fn starred(&self, ctx: &RequestContext) -> AppResult<Listing<File>> {
        let rows = repositories::file::starred(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the user's public files.
    pub async fn public(&self, ctx: &RequestContext) -> AppResult<Listing<File>> {
        let rows = repositories::file::public_listing(&self.pool, ctx.user_id()).await?;
        Ok(Listing::from_rows(rows))
    }

    /// List the user's most recently uploaded files.
    pub async fn recent(&self, ctx: &RequestContext, limit: i64) -> AppResult<Listing<File>> {
        let rows =
            repositories::file::recent(&self.pool, ctx.user_id(), limit.clamp(1, 100)).await?;
        Ok(Listing::from_rows(rows))
    }

    /// Best-effort reversal of a physical rename whose metadata write
    /// failed.
    async fn undo_rename(&self, new_path: &Path, old_path: &Path, old_name: &str) {
        if let Some(parent) = old_path.parent() {
            if self
                .vault
                .rename_file(new_path, parent, old_name)
                .await
                .is_ok()
            {
                return;
            }
        }
        tracing::error!(
            path = %new_path.display(),
            "Failed to reverse file rename after metadata failure; trees diverged"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_classifies_by_content_not_extension() {
        // Minimal PNG magic bytes.
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let (mime, kind) = sniff(&png);
        assert_eq!(mime.as_deref(), Some("image/png"));
        assert_eq!(kind, FileKind::Image);

        // Plain text sniffs to nothing, whatever the caller named it.
        let text = Bytes::from_static(b"just some text pretending to be cat.png");
        let (mime, kind) = sniff(&text);
        assert_eq!(mime, None);
        assert_eq!(kind, FileKind::None);
    }

    #[test]
    fn test_sniff_pdf() {
        let pdf = Bytes::from_static(b"%PDF-1.4 minimal");
        let (mime, kind) = sniff(&pdf);
        assert_eq!(mime.as_deref(), Some("application/pdf"));
        assert_eq!(kind, FileKind::Pdf);
    }
}
