//! Lampo - Observable file storage over interchangeable backends
//!
//! [`Lampo`] wraps one [`StorageBackend`] and forwards `read`, `write`,
//! `put`, `delete` and `update` to it. After each successful call it hands a
//! structured [`Event`] to every registered listener, in registration order.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use lampo::{Lampo, MemoryStorage};
//!
//! # tokio_test::block_on(async {
//! let lampo = Lampo::new(MemoryStorage::new());
//! lampo.on(|event| println!("{} {}", event.event_type, event.path));
//!
//! lampo.write("f", Bytes::from("Hello")).await.unwrap();
//! lampo.update("f", Bytes::from(", World"), false).await.unwrap();
//!
//! let data = lampo::read_to_bytes(lampo.read("f").await.unwrap()).await.unwrap();
//! assert_eq!(&data[..], b"Hello, World");
//! # });
//! ```

mod facade;
mod listeners;

pub use facade::Lampo;
pub use listeners::{Listener, Listeners};

pub use lampo_core::{
    BackendConfig, Error, ErrorKind, Event, EventType, LampoConfig, Result, S3Config,
    StaticCredentials,
};
pub use storage::{
    open_backend, read_to_bytes, LocalStorage, MemoryStorage, ObjectReader, StorageBackend,
};

#[cfg(feature = "s3")]
pub use storage::S3Storage;
