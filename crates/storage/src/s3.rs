//! S3 storage backend
//!
//! Provides S3-compatible object storage with:
//! - A bucket check at construction, bounded by the connect timeout
//! - An independent timeout on every remote request
//! - Custom endpoint support (for MinIO, LocalStack, etc.)
//!
//! There is no retry logic here; transient failures reach the caller as-is.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{http::HttpResponse, Builder as S3ConfigBuilder, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use lampo_core::{Error, Result, S3Config};
use tracing::{debug, info, instrument};

use crate::backend::{merge_update, reader_from_bytes, ObjectReader};
use crate::StorageBackend;

/// Timeout applied to each individual remote request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_FORBIDDEN: u16 = 403;
const STATUS_NOT_FOUND: u16 = 404;

/// S3-compatible storage backend
///
/// Object keys are the logical paths, unchanged.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Connect to the configured bucket
    ///
    /// Loading the SDK configuration and checking the bucket share the
    /// connect timeout. An unreachable or inaccessible bucket fails here
    /// rather than on first use.
    pub async fn connect(config: S3Config) -> Result<Self> {
        config.validate()?;
        let timeout = config.connect_timeout;
        let bucket = config.bucket.clone();

        let connect = async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()));

            if let Some(credentials) = &config.credentials {
                loader = loader.credentials_provider(Credentials::new(
                    credentials.access_key_id.clone(),
                    credentials.secret_access_key.clone(),
                    None,
                    None,
                    "lampo-static",
                ));
            }

            let sdk_config = loader.load().await;
            let mut s3_config_builder = S3ConfigBuilder::from(&sdk_config);

            if let Some(endpoint) = &config.endpoint {
                s3_config_builder = s3_config_builder
                    .endpoint_url(endpoint)
                    .force_path_style(true);
            }

            let storage = Self {
                client: Client::from_conf(s3_config_builder.build()),
                bucket: config.bucket.clone(),
            };
            storage.check_bucket().await?;
            Ok::<_, Error>(storage)
        };

        let storage = match tokio::time::timeout(timeout, connect).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::BucketUnreachable {
                    bucket,
                    message: format!("timed out after {}ms", timeout.as_millis()),
                })
            }
        };

        info!(bucket = %storage.bucket, endpoint = ?config.endpoint, "Connected to S3 bucket");
        Ok(storage)
    }

    /// Wrap an already configured client, skipping the bucket check
    #[cfg(test)]
    fn with_client(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Bucket this backend stores objects in
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn check_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let not_found = e.as_service_error().is_some_and(|se| se.is_not_found());
                Err(bucket_check_error(
                    &self.bucket,
                    status_of(&e),
                    not_found,
                    DisplayErrorContext(&e).to_string(),
                ))
            }
        }
    }

    /// Run one remote request under [`REQUEST_TIMEOUT`]
    async fn with_timeout<T, F>(
        &self,
        operation: &'static str,
        path: &str,
        request: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(REQUEST_TIMEOUT, request).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation,
                path: path.to_string(),
                timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
            }),
        }
    }

    /// Metadata-only existence check
    async fn exists(&self, operation: &'static str, path: &str) -> Result<bool> {
        self.with_timeout(operation, path, async {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(path)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e)
                    if e.as_service_error().is_some_and(|se| se.is_not_found())
                        || status_of(&e) == Some(STATUS_NOT_FOUND) =>
                {
                    Ok(false)
                }
                Err(e) => Err(object_error(operation, path, &e)),
            }
        })
        .await
    }

    /// Fetch the whole object; `None` only when the key does not exist
    async fn fetch(&self, operation: &'static str, path: &str) -> Result<Option<Bytes>> {
        self.with_timeout(operation, path, async {
            let output = match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(path)
                .send()
                .await
            {
                Ok(output) => output,
                Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                    return Ok(None)
                }
                Err(e) => return Err(object_error(operation, path, &e)),
            };

            output
                .body
                .collect()
                .await
                .map(|data| Some(data.into_bytes()))
                .map_err(|e| Error::Remote {
                    operation,
                    path: path.to_string(),
                    message: format!("Failed to read S3 response body: {}", e),
                })
        })
        .await
    }

    async fn upload(&self, operation: &'static str, path: &str, data: Bytes) -> Result<()> {
        self.with_timeout(operation, path, async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(path)
                .body(ByteStream::from(data))
                .send()
                .await
                .map(|_| ())
                .map_err(|e| object_error(operation, path, &e))
        })
        .await
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    #[instrument(skip(self), fields(backend = "s3", bucket = %self.bucket))]
    async fn read(&self, path: &str) -> Result<ObjectReader> {
        debug!("Reading from S3");
        match self.fetch("read", path).await? {
            Some(data) => Ok(reader_from_bytes(data)),
            None => Err(Error::FileNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Create-only upload
    ///
    /// The existence check and the upload are two separate requests with no
    /// compare-and-swap between them. Two concurrent writers of the same
    /// absent key can both pass the check and both succeed; the later upload
    /// wins.
    #[instrument(skip(self, data), fields(backend = "s3", bucket = %self.bucket, size = data.len()))]
    async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        if self.exists("write", path).await? {
            return Err(Error::FileExists {
                path: path.to_string(),
            });
        }

        debug!("Writing to S3");
        self.upload("write", path, data).await
    }

    #[instrument(skip(self, data), fields(backend = "s3", bucket = %self.bucket, size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        debug!("Putting to S3");
        self.upload("put", path, data).await
    }

    #[instrument(skip(self), fields(backend = "s3", bucket = %self.bucket))]
    async fn delete(&self, path: &str) -> Result<()> {
        if !self.exists("delete", path).await? {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        debug!("Deleting from S3");
        self.with_timeout("delete", path, async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(path)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| object_error("delete", path, &e))
        })
        .await
    }

    /// Read-modify-write of the whole object
    ///
    /// A missing object counts as empty; any other fetch failure aborts the
    /// update.
    #[instrument(skip(self, data), fields(backend = "s3", bucket = %self.bucket, size = data.len()))]
    async fn update(&self, path: &str, data: Bytes, prepend: bool) -> Result<()> {
        let existing = self
            .fetch("update", path)
            .await?
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default();

        let merged = merge_update(existing, &data, prepend);
        debug!(new_size = merged.len(), prepend, "Rewriting S3 object");
        self.upload("update", path, Bytes::from(merged)).await
    }
}

fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

fn object_error<E>(operation: &'static str, path: &str, err: &SdkError<E, HttpResponse>) -> Error
where
    E: std::error::Error + 'static,
{
    classify_object_error(operation, path, status_of(err), DisplayErrorContext(err).to_string())
}

fn classify_object_error(
    operation: &'static str,
    path: &str,
    status: Option<u16>,
    message: String,
) -> Error {
    match status {
        Some(STATUS_FORBIDDEN) => Error::PermissionDenied {
            path: path.to_string(),
        },
        _ => Error::Remote {
            operation,
            path: path.to_string(),
            message,
        },
    }
}

fn bucket_check_error(bucket: &str, status: Option<u16>, not_found: bool, message: String) -> Error {
    match status {
        _ if not_found => Error::BucketNotFound {
            bucket: bucket.to_string(),
        },
        Some(STATUS_NOT_FOUND) => Error::BucketNotFound {
            bucket: bucket.to_string(),
        },
        Some(STATUS_FORBIDDEN) => Error::BucketAccessDenied {
            bucket: bucket.to_string(),
        },
        _ => Error::BucketUnreachable {
            bucket: bucket.to_string(),
            message,
        },
    }
}
