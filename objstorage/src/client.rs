//! Provider dispatch and the operation surface callers use.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use url::Url;

use crate::{
    Provider,
    StorageConfig,
    StorageError,
    StorageMetrics,
    StorageResult,
    backends::{azure::AzureBlobStorage, s3::S3CompatibleStorage},
};

/// Operations every backend implements.
///
/// Payloads are fully buffered in memory in both directions.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Single-shot PUT of `data` to `bucket/key`.
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Fetch the whole object. A missing object is a transport error.
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Remove the object. Behaviour for a missing key is the provider's.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// URL that lets its holder PUT `bucket/key` until `expires` elapses.
    async fn presigned_url(&self, bucket: &str, key: &str, expires: Duration) -> StorageResult<Url>;

    /// Create the bucket unless it already exists.
    async fn make_bucket(&self, bucket: &str) -> StorageResult<()>;
}

/// Client for a single provider, selected once from [`StorageConfig`].
///
/// Cloning is cheap and clones share the underlying connection pool. Every
/// operation takes a [`CancellationToken`]; cancelling it aborts the
/// in-flight request and the call returns [`StorageError::Cancelled`].
#[derive(Clone)]
pub struct ObjectStorageClient {
    provider: Provider,
    backend: Arc<dyn ObjectStorage>,
    metrics: StorageMetrics,
}

impl fmt::Debug for ObjectStorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStorageClient")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl ObjectStorageClient {
    /// Build the backend for `config.provider`. No network call is made.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let backend: Arc<dyn ObjectStorage> = match config.provider {
            Provider::Aws => Arc::new(S3CompatibleStorage::aws(&config)?),
            Provider::Gcp => Arc::new(S3CompatibleStorage::gcs(&config)?),
            Provider::Azure => Arc::new(AzureBlobStorage::new(&config)?),
        };

        info!(
            provider = %config.provider,
            endpoint = %config.endpoint,
            region = %config.region,
            "Created object storage client"
        );

        Ok(Self::with_backend(config.provider, backend))
    }

    /// Wrap an existing backend. `provider` is only used to label telemetry.
    pub fn with_backend(provider: Provider, backend: Arc<dyn ObjectStorage>) -> Self {
        Self {
            provider,
            backend,
            metrics: StorageMetrics::global(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn upload(
        &self,
        cancel: &CancellationToken,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> StorageResult<()> {
        self.run("upload", bucket, Some(key), cancel, self.backend.upload(bucket, key, data))
            .await
    }

    pub async fn download(
        &self,
        cancel: &CancellationToken,
        bucket: &str,
        key: &str,
    ) -> StorageResult<Vec<u8>> {
        self.run("download", bucket, Some(key), cancel, self.backend.download(bucket, key))
            .await
    }

    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        bucket: &str,
        key: &str,
    ) -> StorageResult<()> {
        self.run("delete", bucket, Some(key), cancel, self.backend.delete(bucket, key))
            .await
    }

    /// Presigned upload (PUT) URL; downloads are never presigned.
    pub async fn presigned_url(
        &self,
        cancel: &CancellationToken,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> StorageResult<Url> {
        self.run(
            "presigned_url",
            bucket,
            Some(key),
            cancel,
            self.backend.presigned_url(bucket, key, expires),
        )
        .await
    }

    /// Check-then-create; not atomic with respect to other callers.
    pub async fn make_bucket(&self, cancel: &CancellationToken, bucket: &str) -> StorageResult<()> {
        self.run("make_bucket", bucket, None, cancel, self.backend.make_bucket(bucket))
            .await
    }

    async fn run<T, F>(
        &self,
        operation: &'static str,
        bucket: &str,
        key: Option<&str>,
        cancel: &CancellationToken,
        fut: F,
    ) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let span = info_span!(
            "object_storage",
            operation,
            provider = %self.provider,
            bucket,
            key = key.unwrap_or_default(),
        );
        let timer = self.metrics.start(self.provider, operation);

        let result = async {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(StorageError::Cancelled { operation }),
                result = fut => result,
            };
            if let Err(err) = &result {
                warn!(error = %err, "Object storage operation failed");
            }
            result
        }
        .instrument(span)
        .await;

        timer.finish(&result);
        result
    }
}
