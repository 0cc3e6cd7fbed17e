//! Storage backend trait definition
//!
//! Defines the async interface that all storage backends must implement.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use lampo_core::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Readable stream over an object's bytes, positioned at offset 0
///
/// Dropping the reader closes it.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Async trait for storage backends
///
/// Every implementor must be observably identical for the same sequence of
/// calls: the same sentinel errors for the same logical conditions and the
/// same byte-exact results.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Open a reader over the current bytes at `path`
    ///
    /// # Errors
    /// Returns `FileNotFound` if nothing is stored at `path`
    async fn read(&self, path: &str) -> Result<ObjectReader>;

    /// Create a new object at `path`
    ///
    /// This is create-only: it never overwrites.
    ///
    /// # Errors
    /// Returns `FileExists` if an object is already stored at `path`
    async fn write(&self, path: &str, data: Bytes) -> Result<()>;

    /// Create or replace the object at `path`
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Remove the object at `path`
    ///
    /// # Errors
    /// Returns `FileNotFound` if nothing is stored at `path`
    async fn delete(&self, path: &str) -> Result<()>;

    /// Append (or prepend) `data` to the object at `path`
    ///
    /// Behaves like [`put`](StorageBackend::put) when the object is absent.
    /// Concatenation is byte-exact; no delimiter is inserted.
    async fn update(&self, path: &str, data: Bytes, prepend: bool) -> Result<()>;
}

/// Wrap an owned snapshot of bytes as an [`ObjectReader`]
pub fn reader_from_bytes(data: Bytes) -> ObjectReader {
    Box::new(Cursor::new(data))
}

/// Drain a reader into memory
///
/// The reader carries no path, so a failure surfaces as [`Error::Stream`].
pub async fn read_to_bytes(mut reader: ObjectReader) -> Result<Bytes> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(|source| Error::Stream { source })?;
    Ok(Bytes::from(buf))
}

/// Combine existing content with update data
///
/// Append grows `existing` in place; prepend allocates a fresh buffer.
pub(crate) fn merge_update(mut existing: Vec<u8>, data: &[u8], prepend: bool) -> Vec<u8> {
    if prepend {
        let mut merged = Vec::with_capacity(data.len() + existing.len());
        merged.extend_from_slice(data);
        merged.extend_from_slice(&existing);
        merged
    } else {
        existing.extend_from_slice(data);
        existing
    }
}
