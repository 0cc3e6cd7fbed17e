//! Local filesystem storage backend
//!
//! Maps logical paths to files under a root directory. Every file is first
//! written to a temp sibling, then renamed (replace) or hard-linked
//! (create-only) into place, so a reader never opens a half-written object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use lampo_core::{Error, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::backend::ObjectReader;
use crate::StorageBackend;

/// Local filesystem storage backend
///
/// No internal locking: two concurrent operations on the same path race the
/// way the filesystem lets them.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Base path for all storage operations
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage, creating the root directory if needed
    ///
    /// # Errors
    /// Returns `RootUnavailable` if the root cannot be created
    pub async fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|source| Error::RootUnavailable {
                root: base_path.display().to_string(),
                source,
            })?;

        info!(root = ?base_path, "Opened local storage");
        Ok(Self { base_path })
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a logical path to a file under the root
    fn resolve_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Generate a unique temporary sibling for `full_path`
    fn temp_path(full_path: &Path) -> PathBuf {
        let temp_name = format!(
            ".{}.{}.tmp",
            full_path.file_name().unwrap_or_default().to_string_lossy(),
            Uuid::new_v4()
        );
        full_path.with_file_name(temp_name)
    }

    /// Stat-based existence check; only a missing entry counts as absent
    async fn exists(operation: &'static str, path: &str, full_path: &Path) -> Result<bool> {
        fs::try_exists(full_path)
            .await
            .map_err(|e| Error::io(operation, path, e))
    }

    async fn ensure_parent(
        &self,
        operation: &'static str,
        path: &str,
        full_path: &Path,
    ) -> Result<()> {
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(operation, path, e))?;
        }
        Ok(())
    }

    /// Write `chunks` in order to a fresh temp sibling of `full_path`
    ///
    /// The temp file is removed again if any step fails.
    async fn stage_file(full_path: &Path, chunks: &[&[u8]]) -> std::io::Result<PathBuf> {
        let temp_path = Self::temp_path(full_path);

        let result = async {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .await?;
            for chunk in chunks {
                file.write_all(chunk).await?;
            }
            file.sync_all().await
        }
        .await;

        match result {
            Ok(()) => Ok(temp_path),
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    /// Replace `full_path` with `chunks` written in order, via temp + rename
    async fn replace_file(
        &self,
        operation: &'static str,
        path: &str,
        full_path: &Path,
        chunks: &[&[u8]],
    ) -> Result<()> {
        let temp_path = Self::stage_file(full_path, chunks)
            .await
            .map_err(|e| Error::io(operation, path, e))?;
        debug!(?full_path, ?temp_path, "Replacing file atomically");

        if let Err(e) = fs::rename(&temp_path, full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::io(operation, path, e));
        }
        Ok(())
    }

    /// Publish a fully written temp file at `full_path` only if nothing is there
    ///
    /// `hard_link` refuses an existing target, so a concurrent second creator
    /// gets `FileExists` and a failed write never leaves a partial object.
    async fn create_file(&self, path: &str, full_path: &Path, data: &[u8]) -> Result<()> {
        let temp_path = Self::stage_file(full_path, &[data])
            .await
            .map_err(|e| Error::io("write", path, e))?;

        let linked = fs::hard_link(&temp_path, full_path).await;
        let _ = fs::remove_file(&temp_path).await;

        linked.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => Error::FileExists {
                path: path.to_string(),
            },
            _ => Error::io("write", path, e),
        })
    }

    async fn append_to_file(&self, path: &str, full_path: &Path, data: &[u8]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(full_path)
            .await
            .map_err(|e| Error::io("update", path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| Error::io("update", path, e))?;
        file.flush()
            .await
            .map_err(|e| Error::io("update", path, e))
    }

    /// Prepend costs a full read of the existing file
    async fn prepend_to_file(&self, path: &str, full_path: &Path, data: &[u8]) -> Result<()> {
        let existing = fs::read(full_path)
            .await
            .map_err(|e| Error::io("update", path, e))?;
        self.replace_file("update", path, full_path, &[data, &existing[..]])
            .await
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    #[instrument(skip(self), fields(backend = "local"))]
    async fn read(&self, path: &str) -> Result<ObjectReader> {
        let full_path = self.resolve_path(path);
        debug!(?full_path, "Reading file");

        if !Self::exists("read", path, &full_path).await? {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| Error::from_io("read", path, e))?;

        // Directories open fine on unix but are not objects
        let metadata = file
            .metadata()
            .await
            .map_err(|e| Error::io("read", path, e))?;
        if !metadata.is_file() {
            return Err(Error::io(
                "read",
                path,
                std::io::Error::other("not a regular file"),
            ));
        }
        Ok(Box::new(file))
    }

    #[instrument(skip(self, data), fields(backend = "local", size = data.len()))]
    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        let full_path = self.resolve_path(path);

        if Self::exists("write", path, &full_path).await? {
            return Err(Error::FileExists {
                path: path.to_string(),
            });
        }

        self.ensure_parent("write", path, &full_path).await?;
        self.create_file(path, &full_path, &data).await?;

        debug!(?full_path, "File created");
        Ok(())
    }

    #[instrument(skip(self, data), fields(backend = "local", size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let full_path = self.resolve_path(path);
        self.ensure_parent("put", path, &full_path).await?;
        self.replace_file("put", path, &full_path, &[&data[..]]).await?;

        debug!(?full_path, "File written");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve_path(path);
        debug!(?full_path, "Deleting file");

        if !Self::exists("delete", path, &full_path).await? {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        fs::remove_file(&full_path)
            .await
            .map_err(|e| Error::from_io("delete", path, e))
    }

    #[instrument(skip(self, data), fields(backend = "local", size = data.len()))]
    async fn update(&self, path: &str, data: Bytes, prepend: bool) -> Result<()> {
        let full_path = self.resolve_path(path);

        if !Self::exists("update", path, &full_path).await? {
            debug!(?full_path, "Update target absent, creating");
            return self.put(path, data).await;
        }

        if prepend {
            self.prepend_to_file(path, &full_path, &data).await
        } else {
            self.append_to_file(path, &full_path, &data).await
        }
    }
}
