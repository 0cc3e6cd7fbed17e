//! Storage - Interchangeable backends behind one five-operation contract
//!
//! Provides async storage operations with support for:
//! - Local filesystem
//! - In-process memory
//! - Amazon S3 / S3-compatible storage (with `s3` feature)
//!
//! Every backend raises the same sentinel errors from `lampo_core` for the
//! same logical condition.
//!
//! # Example
//!
//! ```no_run
//! use storage::{read_to_bytes, LocalStorage, StorageBackend};
//! use bytes::Bytes;
//!
//! # async fn example() -> lampo_core::Result<()> {
//! let storage = LocalStorage::new("/tmp/lampo").await?;
//! storage.write("notes/today.txt", Bytes::from("Hello")).await?;
//! storage.update("notes/today.txt", Bytes::from(", World"), false).await?;
//! let data = read_to_bytes(storage.read("notes/today.txt").await?).await?;
//! assert_eq!(&data[..], b"Hello, World");
//! # Ok(())
//! # }
//! ```

mod backend;
mod factory;
mod local;
mod memory;

#[cfg(feature = "s3")]
mod s3;

pub use backend::{read_to_bytes, reader_from_bytes, ObjectReader, StorageBackend};
pub use factory::open_backend;
pub use local::LocalStorage;
pub use memory::{MemoryStorage, ObjectStat};

#[cfg(feature = "s3")]
pub use s3::{S3Storage, REQUEST_TIMEOUT};
