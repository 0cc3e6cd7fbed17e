//! Error types shared by every storage backend

use thiserror::Error;

/// Result type alias using the lampo Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lampo storage operations
///
/// The first three variants are sentinels: every backend raises them for the
/// same logical condition, so callers can branch on [`Error::kind`] no matter
/// which backend produced the error. Everything else is backend specific and
/// carries the operation and path for context.
#[derive(Error, Debug)]
pub enum Error {
    // Sentinels
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("file already exists: {path}")]
    FileExists { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    // Transport errors
    #[error("I/O error during {operation} of {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote storage error during {operation} of {path}: {message}")]
    Remote {
        operation: &'static str,
        path: String,
        message: String,
    },

    #[error("I/O error while draining object stream: {source}")]
    Stream {
        #[source]
        source: std::io::Error,
    },

    #[error("Operation timeout: {operation} of {path} after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        path: String,
        timeout_ms: u64,
    },

    // Construction errors
    #[error("Storage root unavailable: {root}: {source}")]
    RootUnavailable {
        root: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bucket does not exist: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("Access denied to bucket: {bucket}")]
    BucketAccessDenied { bucket: String },

    #[error("Failed to connect to bucket {bucket}: {message}")]
    BucketUnreachable { bucket: String, message: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Closed set of error kinds, compared by identity rather than message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    FileExists,
    PermissionDenied,
    Io,
    Remote,
    Timeout,
    Construction,
    Config,
}

impl Error {
    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound { .. } => ErrorKind::FileNotFound,
            Error::FileExists { .. } => ErrorKind::FileExists,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::Io { .. } | Error::Stream { .. } => ErrorKind::Io,
            Error::Remote { .. } => ErrorKind::Remote,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::RootUnavailable { .. }
            | Error::BucketNotFound { .. }
            | Error::BucketAccessDenied { .. }
            | Error::BucketUnreachable { .. } => ErrorKind::Construction,
            Error::InvalidConfig { .. } | Error::Serialization(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::FileNotFound
    }

    pub fn is_exists(&self) -> bool {
        self.kind() == ErrorKind::FileExists
    }

    /// Returns true for the shared domain sentinels
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FileNotFound | ErrorKind::FileExists | ErrorKind::PermissionDenied
        )
    }

    /// Returns true if a caller-owned retry may succeed
    ///
    /// Nothing in lampo retries on its own; this is only a hint.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. } | Error::Timeout { .. } | Error::BucketUnreachable { .. }
        ) || matches!(self, Error::Io { source, .. } | Error::Stream { source } if matches!(
            source.kind(),
            std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ))
    }

    /// Returns true if this error indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Construction | ErrorKind::Config)
    }

    /// The logical path this error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::FileNotFound { path }
            | Error::FileExists { path }
            | Error::PermissionDenied { path }
            | Error::Io { path, .. }
            | Error::Remote { path, .. }
            | Error::Timeout { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Wraps a native I/O error whose target is the object itself
    ///
    /// Only use this where `NotFound` and `AlreadyExists` refer to `path`, not
    /// to a parent directory or a temp file.
    pub fn from_io(operation: &'static str, path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_string(),
            },
            std::io::ErrorKind::AlreadyExists => Error::FileExists {
                path: path.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                path: path.to_string(),
            },
            _ => Error::Io {
                operation,
                path: path.to_string(),
                source,
            },
        }
    }

    /// Wraps a native I/O error from a helper step (parent directories,
    /// temp files, stat calls)
    ///
    /// Existence conditions stay opaque here; only a permission failure maps
    /// to its sentinel.
    pub fn io(operation: &'static str, path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                path: path.to_string(),
            },
            _ => Error::Io {
                operation,
                path: path.to_string(),
                source,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
