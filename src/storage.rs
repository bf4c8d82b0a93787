//! Receipt blob storage.
//!
//! Payment receipts are kept outside the database and referenced by an opaque
//! relative path stored on the payable row. The [`ReceiptStore`] trait keeps
//! the core logic independent of where the bytes actually live; the default
//! backend writes them under a configured media root on the local filesystem.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Abstraction over the receipt blob store.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Persists `bytes` under a path derived from `suggested_path`, returning
    /// the reference to store on the payable. The returned path may differ
    /// from the suggestion when a collision had to be resolved.
    async fn save(&self, suggested_path: &str, bytes: &[u8]) -> Result<String>;

    /// Removes the blob at `path`. Removing an already-absent blob is not an
    /// error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Reads the blob at `path` back into memory.
    async fn open(&self, path: &str) -> Result<Vec<u8>>;

    /// Reports whether a blob exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem-backed receipt store rooted at the configured media directory.
#[derive(Debug, Clone)]
pub struct FsReceiptStore {
    root: PathBuf,
}

impl FsReceiptStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a stored reference to an absolute path, rejecting any
    /// component that would escape the media root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if escapes || relative.as_os_str().is_empty() {
            return Err(Error::validation(
                "receipt",
                format!("invalid receipt path: {path}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ReceiptStore for FsReceiptStore {
    async fn save(&self, suggested_path: &str, bytes: &[u8]) -> Result<String> {
        let mut reference = suggested_path.to_string();
        let mut target = self.resolve(&reference)?;

        // Uniquify on collision: name.ext, name-2.ext, name-3.ext, ...
        let mut counter = 2;
        while tokio::fs::try_exists(&target).await? {
            let path = Path::new(suggested_path);
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("receipt");
            let extension = path
                .extension()
                .and_then(|extension| extension.to_str())
                .map(|extension| format!(".{extension}"))
                .unwrap_or_default();
            let parent = path
                .parent()
                .and_then(|parent| parent.to_str())
                .unwrap_or("");
            reference = if parent.is_empty() {
                format!("{stem}-{counter}{extension}")
            } else {
                format!("{parent}/{stem}-{counter}{extension}")
            };
            target = self.resolve(&reference)?;
            counter += 1;
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(reference)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    async fn open(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
                entity: "receipt",
            }),
            Err(error) => Err(error.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }
}
