//! Backend configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Default timeout for establishing an object-storage connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Main lampo configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LampoConfig {
    /// Backend the facade is bound to
    pub backend: BackendConfig,
}

impl LampoConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LampoConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::InvalidConfig {
            message: format!("Failed to read config {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.backend.validate()
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Local filesystem rooted at a directory
    Local { root: String },

    /// In-process memory store
    #[default]
    Memory,

    /// S3-compatible object storage
    S3(S3Config),
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            BackendConfig::Local { root } if root.trim().is_empty() => Err(Error::InvalidConfig {
                message: "local backend root must not be empty".to_string(),
            }),
            BackendConfig::Local { .. } | BackendConfig::Memory => Ok(()),
            BackendConfig::S3(s3) => s3.validate(),
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Region the bucket lives in
    pub region: String,

    /// Bucket name
    pub bucket: String,

    /// Optional custom endpoint URL (MinIO, LocalStack, ...)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional static credentials; the default provider chain is used otherwise
    #[serde(default)]
    pub credentials: Option<StaticCredentials>,

    /// Timeout for loading configuration and probing the bucket
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            bucket: String::new(),
            endpoint: None,
            credentials: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl S3Config {
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "s3 bucket must not be empty".to_string(),
            });
        }
        if self.region.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "s3 region must not be empty".to_string(),
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidConfig {
                message: "s3 connect timeout must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Static access key pair
#[derive(Clone, Serialize, Deserialize)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

/// Duration serialization helper, stored as milliseconds
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
