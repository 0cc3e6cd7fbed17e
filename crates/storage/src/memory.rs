//! In-process memory storage backend
//!
//! One reader/writer lock guards the whole map. Reads share the lock and copy
//! the bytes out before returning; every mutation takes the lock exclusively,
//! so a reader sees either the full old content or the full new content.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use lampo_core::{Error, Result};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::backend::{merge_update, reader_from_bytes, ObjectReader};
use crate::StorageBackend;

/// A stored object with its bookkeeping timestamps
#[derive(Debug)]
struct MemoryObject {
    data: Vec<u8>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemoryObject {
    fn new(data: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Informational metadata for an object held by [`MemoryStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStat {
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-process storage backend keyed by logical path
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, MemoryObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size and timestamps of the object at `path`, if present
    pub fn stat(&self, path: &str) -> Option<ObjectStat> {
        self.objects.read().get(path).map(|object| ObjectStat {
            size: object.data.len(),
            created_at: object.created_at,
            updated_at: object.updated_at,
        })
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    #[instrument(skip(self), fields(backend = "memory"))]
    async fn read(&self, path: &str) -> Result<ObjectReader> {
        let objects = self.objects.read();
        let object = objects.get(path).ok_or_else(|| Error::FileNotFound {
            path: path.to_string(),
        })?;

        // Private copy: later writers must not reach caller-held bytes.
        let snapshot = Bytes::copy_from_slice(&object.data);
        debug!(size = snapshot.len(), "Read object snapshot");
        Ok(reader_from_bytes(snapshot))
    }

    #[instrument(skip(self, data), fields(backend = "memory", size = data.len()))]
    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        let mut objects = self.objects.write();
        if objects.contains_key(path) {
            return Err(Error::FileExists {
                path: path.to_string(),
            });
        }

        objects.insert(path.to_string(), MemoryObject::new(data.to_vec()));
        debug!("Created object");
        Ok(())
    }

    #[instrument(skip(self, data), fields(backend = "memory", size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let mut objects = self.objects.write();
        match objects.get_mut(path) {
            Some(object) => {
                object.data = data.to_vec();
                object.updated_at = Utc::now();
                debug!("Replaced object");
            }
            None => {
                objects.insert(path.to_string(), MemoryObject::new(data.to_vec()));
                debug!("Created object");
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn delete(&self, path: &str) -> Result<()> {
        let mut objects = self.objects.write();
        match objects.remove(path) {
            Some(_) => Ok(()),
            None => Err(Error::FileNotFound {
                path: path.to_string(),
            }),
        }
    }

    #[instrument(skip(self, data), fields(backend = "memory", size = data.len()))]
    async fn update(&self, path: &str, data: Bytes, prepend: bool) -> Result<()> {
        let mut objects = self.objects.write();
        let Some(object) = objects.get_mut(path) else {
            objects.insert(path.to_string(), MemoryObject::new(data.to_vec()));
            debug!("Update created absent object");
            return Ok(());
        };

        let existing = std::mem::take(&mut object.data);
        object.data = merge_update(existing, &data, prepend);
        object.updated_at = Utc::now();
        debug!(new_size = object.data.len(), prepend, "Updated object");
        Ok(())
    }
}
