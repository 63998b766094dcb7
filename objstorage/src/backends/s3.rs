//! S3-compatible backend for AWS S3 and the GCS interoperability API.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client as S3Client,
    config::{
        BehaviorVersion,
        Credentials,
        Region,
        RequestChecksumCalculation,
        ResponseChecksumValidation,
    },
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use tracing::{debug, info};
use url::Url;

use crate::{
    ObjectStorage,
    StorageConfig,
    StorageError,
    StorageResult,
    presign,
    signing::{GcsV4Signer, SignOptions},
};

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// How presigned upload URLs are produced. Fixed when the store is built.
#[derive(Debug, Clone)]
enum Presigner {
    /// SigV4 presigning from the AWS SDK.
    Native,
    /// GOOG4 signing for Google Cloud Storage.
    GcsV4(GcsV4Signer),
}

/// Object storage over any S3-protocol endpoint.
#[derive(Debug, Clone)]
pub struct S3CompatibleStorage {
    client: S3Client,
    region: String,
    presigner: Presigner,
}

impl S3CompatibleStorage {
    /// Store for AWS S3 or another SigV4 endpoint (MinIO, Ceph, ...).
    pub fn aws(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self::build(config, Presigner::Native))
    }

    /// Store for GCS through its S3 interoperability API.
    pub fn gcs(config: &StorageConfig) -> StorageResult<Self> {
        let signer = GcsV4Signer::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            config.region.clone(),
        );
        Ok(Self::build(config, Presigner::GcsV4(signer)))
    }

    fn build(config: &StorageConfig, presigner: Presigner) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "objstorage-static",
        );

        // S3-compatible facades reject the SDK's default flexible checksums.
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired);
        if let Some(endpoint) = config.endpoint_url() {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        debug!(
            endpoint = %config.endpoint,
            region = %config.region,
            "Created S3-compatible store"
        );

        Self {
            client: S3Client::from_conf(builder.build()),
            region: config.region.clone(),
            presigner,
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found()) ||
                    err.raw_response()
                        .is_some_and(|response| response.status().as_u16() == 404);
                if not_found {
                    Ok(false)
                } else {
                    Err(StorageError::transport(
                        "failed to check bucket existence",
                        err,
                    ))
                }
            }
        }
    }
}

fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    if region.is_empty() || region == DEFAULT_REGION {
        None
    } else {
        Some(BucketLocationConstraint::from(region))
    }
}

#[async_trait]
impl ObjectStorage for S3CompatibleStorage {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::transport("failed to upload object", e))?;
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::transport("failed to get object", e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::transport("failed to read object data", e))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::transport("failed to delete object", e))?;
        Ok(())
    }

    async fn presigned_url(&self, bucket: &str, key: &str, expires: Duration) -> StorageResult<Url> {
        presign::validate_expiry(expires)?;

        match &self.presigner {
            Presigner::Native => {
                let presigning_config = PresigningConfig::expires_in(expires).map_err(|e| {
                    StorageError::presign(format!("failed to create presigning config: {}", e))
                })?;
                let presigned = self
                    .client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .presigned(presigning_config)
                    .await
                    .map_err(|e| StorageError::transport("failed to generate presigned URL", e))?;
                Url::parse(presigned.uri()).map_err(|e| {
                    StorageError::presign(format!("invalid presigned URL from SDK: {}", e))
                })
            }
            Presigner::GcsV4(signer) => {
                signer.presign("PUT", bucket, key, expires, &SignOptions::default())
            }
        }
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        if self.bucket_exists(bucket).await? {
            return Ok(());
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(constraint) = location_constraint(&self.region) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| StorageError::transport("failed to create bucket", e))?;

        info!(bucket = %bucket, region = %self.region, "Created bucket");
        Ok(())
    }
}
