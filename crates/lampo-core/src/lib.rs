//! Lampo Core - Foundation shared by every lampo storage backend
//!
//! Provides the sentinel error taxonomy, the event records emitted by the
//! facade, and the serde-backed configuration types used to pick a backend.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BackendConfig, LampoConfig, S3Config, StaticCredentials};
pub use error::{Error, ErrorKind, Result};
pub use types::*;
