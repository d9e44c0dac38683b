//! Local filesystem vault driver.
//!
//! Physical layout: `<root>/<user id>/<folder>/.../<file>`. The user id
//! directory is unique per account; folder and file names share one
//! namespace per directory, so collisions are a first-class filesystem
//! concern here, not just a metadata one.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A failed vault operation.
///
/// `Rejected` carries expected, recoverable conditions that surface to the
/// caller as request errors. `Invariant` and `Io` are fatal-class: they mean
/// either a programmer error (empty computed path) or an unexpected
/// filesystem fault, and the physical tree can no longer be assumed to
/// match the metadata store.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Expected condition: duplicate name, missing source, unchanged name.
    #[error("{0}")]
    Rejected(String),
    /// Invariant violation (e.g. empty computed path).
    #[error("{0}")]
    Invariant(String),
    /// Unexpected filesystem fault.
    #[error("vault I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Whether this failure should escalate as a server error instead of
    /// being surfaced to the caller as a request error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// A specialized `Result` for vault operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Driver for the local on-disk directory tree.
///
/// Every operation is independently fallible and performs exactly one
/// logical mutation. No operation touches the metadata store; ownership and
/// hierarchy rules live with the coordinator.
#[derive(Debug, Clone)]
pub struct LocalVault {
    /// Root directory under which all per-user trees live.
    root: PathBuf,
}

impl LocalVault {
    /// Create a vault rooted at the given directory, creating it if needed.
    pub async fn new(root_path: impl Into<PathBuf>) -> DriverResult<Self> {
        let root = root_path.into();
        if root.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Empty vault root path".into()));
        }
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the immutable per-user root directory, named by numeric id.
    ///
    /// Fails recoverably if the directory already exists: a second root for
    /// the same user is a duplicate, not a fault.
    pub async fn create_root(&self, user_id: i64) -> DriverResult<PathBuf> {
        let root_path = self.root.join(user_id.to_string());
        if root_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Invalid computed root path".into()));
        }
        match fs::create_dir(&root_path).await {
            Ok(()) => {
                debug!(path = %root_path.display(), "Created user root");
                Ok(root_path)
            }
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                Err(DriverError::Rejected("Root already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a directory under an existing parent.
    ///
    /// `create_dir` is atomic at the OS level, so a concurrent request that
    /// passed the metadata collision check loses the race here and gets a
    /// recoverable rejection.
    pub async fn create_dir(&self, parent: &Path, name: &str) -> DriverResult<PathBuf> {
        let dir_path = parent.join(name);
        if dir_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Invalid computed folder path".into()));
        }
        match fs::create_dir(&dir_path).await {
            Ok(()) => {
                debug!(path = %dir_path.display(), "Created folder");
                Ok(dir_path)
            }
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                Err(DriverError::Rejected("Folder already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a directory in place or move it under a new parent.
    ///
    /// A no-op rename (computed new path equals the old path) is an error,
    /// not a success: callers that want flag-only updates must not reach
    /// the vault at all.
    pub async fn rename_dir(
        &self,
        old_path: &Path,
        new_parent: &Path,
        new_name: &str,
    ) -> DriverResult<PathBuf> {
        if old_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Unprovided folder path".into()));
        }
        if !fs::try_exists(old_path).await? {
            return Err(DriverError::Rejected("Folder does not exist".into()));
        }

        let new_path = new_parent.join(new_name);
        if new_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant(
                "Invalid computed new folder path".into(),
            ));
        }
        if new_path == old_path {
            return Err(DriverError::Rejected("Folder name not changed".into()));
        }
        if fs::try_exists(&new_path).await? {
            return Err(DriverError::Rejected("New name is already in use".into()));
        }

        fs::rename(old_path, &new_path).await?;
        debug!(from = %old_path.display(), to = %new_path.display(), "Renamed folder");
        Ok(new_path)
    }

    /// Write a complete byte buffer as a new file.
    ///
    /// Opens with `create_new` so an existing destination rejects the call
    /// atomically. If the write itself fails midway the partial file is
    /// removed before the error propagates, so an aborted upload never
    /// leaves a half-written file behind.
    pub async fn create_file(
        &self,
        parent: &Path,
        name: &str,
        data: &Bytes,
    ) -> DriverResult<PathBuf> {
        let file_path = parent.join(name);
        if file_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Invalid computed file path".into()));
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(DriverError::Rejected("File already exists".into()));
            }
            Err(e) => return Err(e.into()),
        };

        let write_result = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&file_path).await;
            return Err(e.into());
        }

        debug!(path = %file_path.display(), bytes = data.len(), "Wrote file");
        Ok(file_path)
    }

    /// Rename a file in place or move it under a new parent. Same shape and
    /// rejection rules as [`Self::rename_dir`].
    pub async fn rename_file(
        &self,
        old_path: &Path,
        new_parent: &Path,
        new_name: &str,
    ) -> DriverResult<PathBuf> {
        if old_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant("Unprovided file path".into()));
        }
        if !fs::try_exists(old_path).await? {
            return Err(DriverError::Rejected("File does not exist".into()));
        }

        let new_path = new_parent.join(new_name);
        if new_path.as_os_str().is_empty() {
            return Err(DriverError::Invariant(
                "Invalid computed new file path".into(),
            ));
        }
        if new_path == old_path {
            return Err(DriverError::Rejected("File name not changed".into()));
        }
        if fs::try_exists(&new_path).await? {
            return Err(DriverError::Rejected("New name is already in use".into()));
        }

        fs::rename(old_path, &new_path).await?;
        debug!(from = %old_path.display(), to = %new_path.display(), "Renamed file");
        Ok(new_path)
    }

    /// Read a stored file into memory.
    pub async fn read_file(&self, path: &Path) -> DriverResult<Bytes> {
        match fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(DriverError::Rejected("File does not exist".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort recursive removal, used for rollback compensation and
    /// post-commit cascade cleanup. Missing paths are fine; other failures
    /// are logged and swallowed so cleanup never masks the original error.
    pub async fn remove(&self, paths: &[PathBuf]) {
        for path in paths {
            let outcome = match fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
                Ok(_) => fs::remove_file(path).await,
                Err(e) if e.kind() == IoErrorKind::NotFound => continue,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => debug!(path = %path.display(), "Removed path"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove path"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn vault() -> (tempfile::TempDir, LocalVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = LocalVault::new(dir.path().join("upload")).await.unwrap();
        (dir, vault)
    }

    #[tokio::test]
    async fn test_create_root_once() {
        let (_dir, vault) = vault().await;

        let root = vault.create_root(42).await.unwrap();
        assert!(root.ends_with("42"));
        assert!(root.is_dir());

        let err = vault.create_root(42).await.unwrap_err();
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_create_dir_rejects_duplicate() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();

        let docs = vault.create_dir(&root, "Docs").await.unwrap();
        assert!(docs.is_dir());
        assert_eq!(docs, root.join("Docs"));

        let err = vault.create_dir(&root, "Docs").await.unwrap_err();
        assert!(matches!(err, DriverError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_create_file_returns_physical_path() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();

        let data = Bytes::from_static(b"hello world");
        let path = vault.create_file(&root, "a.txt", &data).await.unwrap();
        assert_eq!(path, root.join("a.txt"));
        assert_eq!(vault.read_file(&path).await.unwrap(), data);

        let err = vault
            .create_file(&root, "a.txt", &Bytes::from_static(b"again"))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        // The original contents survive the rejected overwrite.
        assert_eq!(vault.read_file(&path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_file_and_dir_share_namespace() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();

        vault.create_dir(&root, "shared").await.unwrap();
        let err = vault
            .create_file(&root, "shared", &Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_rename_dir_noop_is_error() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();
        let docs = vault.create_dir(&root, "Docs").await.unwrap();

        let err = vault.rename_dir(&docs, &root, "Docs").await.unwrap_err();
        assert!(matches!(err, DriverError::Rejected(ref msg) if msg.contains("not changed")));
        assert!(docs.is_dir());
    }

    #[tokio::test]
    async fn test_rename_dir_moves_subtree() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();
        let docs = vault.create_dir(&root, "Docs").await.unwrap();
        vault
            .create_file(&docs, "a.txt", &Bytes::from_static(b"a"))
            .await
            .unwrap();

        let renamed = vault.rename_dir(&docs, &root, "Documents").await.unwrap();
        assert_eq!(renamed, root.join("Documents"));
        assert!(!docs.exists());
        assert!(renamed.join("a.txt").is_file());
    }

    #[tokio::test]
    async fn test_rename_dir_rejects_missing_source_and_taken_target() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();
        vault.create_dir(&root, "a").await.unwrap();
        let b = vault.create_dir(&root, "b").await.unwrap();

        let err = vault
            .rename_dir(&root.join("ghost"), &root, "c")
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Rejected(_)));

        let err = vault.rename_dir(&b, &root, "a").await.unwrap_err();
        assert!(matches!(err, DriverError::Rejected(ref msg) if msg.contains("in use")));
    }

    #[tokio::test]
    async fn test_rename_file() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();
        let old = vault
            .create_file(&root, "a.txt", &Bytes::from_static(b"a"))
            .await
            .unwrap();

        let new = vault.rename_file(&old, &root, "b.txt").await.unwrap();
        assert_eq!(new, root.join("b.txt"));
        assert!(!old.exists());
        assert_eq!(vault.read_file(&new).await.unwrap(), Bytes::from_static(b"a"));
    }

    #[tokio::test]
    async fn test_remove_is_recursive_and_forgiving() {
        let (_dir, vault) = vault().await;
        let root = vault.create_root(1).await.unwrap();
        let docs = vault.create_dir(&root, "Docs").await.unwrap();
        let nested = vault.create_dir(&docs, "inner").await.unwrap();
        vault
            .create_file(&nested, "x.txt", &Bytes::from_static(b"x"))
            .await
            .unwrap();
        let loose = vault
            .create_file(&root, "loose.txt", &Bytes::from_static(b"y"))
            .await
            .unwrap();

        vault
            .remove(&[docs.clone(), loose.clone(), root.join("never-existed")])
            .await;
        assert!(!docs.exists());
        assert!(!loose.exists());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_empty_paths_are_invariant_errors() {
        let (_dir, vault) = vault().await;
        let err = vault
            .rename_dir(Path::new(""), Path::new("/tmp"), "x")
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, DriverError::Invariant(_)));
    }
}
