//! Construct a backend from configuration

use lampo_core::{BackendConfig, Result};
use tracing::info;

use crate::{LocalStorage, MemoryStorage, StorageBackend};

/// Build the backend selected by `config`
///
/// Construction failures (unusable root, unreachable bucket) surface here
/// rather than on first use.
pub async fn open_backend(config: &BackendConfig) -> Result<Box<dyn StorageBackend>> {
    config.validate()?;

    match config {
        BackendConfig::Local { root } => {
            info!(%root, "Opening local backend");
            Ok(Box::new(LocalStorage::new(root).await?))
        }
        BackendConfig::Memory => {
            info!("Opening memory backend");
            Ok(Box::new(MemoryStorage::new()))
        }
        #[cfg(feature = "s3")]
        BackendConfig::S3(s3) => {
            info!(bucket = %s3.bucket, region = %s3.region, "Opening s3 backend");
            Ok(Box::new(crate::S3Storage::connect(s3.clone()).await?))
        }
        #[cfg(not(feature = "s3"))]
        BackendConfig::S3(_) => Err(lampo_core::Error::InvalidConfig {
            message: "s3 backend requires the `s3` feature".to_string(),
        }),
    }
}
