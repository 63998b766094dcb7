//! Azure Blob Storage backend using azure_storage_blobs, with SAS tokens
//! for presigning.

use std::time::Duration;

use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_storage::{
    CloudLocation,
    StorageCredentials,
    shared_access_signature::{SasProtocol, service_sas::BlobSasPermissions},
};
use azure_storage_blobs::prelude::*;
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, info};
use url::Url;

use crate::{ObjectStorage, StorageConfig, StorageError, StorageResult};

const CONTAINER_NOT_FOUND: &str = "ContainerNotFound";

/// Azure Blob Storage backend. Buckets map to containers, keys to blobs.
#[derive(Clone)]
pub struct AzureBlobStorage {
    blob_service_client: BlobServiceClient,
    sas_protocol: SasProtocol,
}

impl AzureBlobStorage {
    /// Create the store from an account name (`access_key`) and base64
    /// account key (`secret_key`).
    ///
    /// An empty endpoint targets the public cloud; anything else is used as
    /// the service URL (e.g. `127.0.0.1:10000/devstoreaccount1` for Azurite).
    /// SAS tokens are HTTPS-only unless a custom endpoint has `use_ssl` off.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        STANDARD
            .decode(&config.secret_key)
            .map_err(|e| StorageError::construction("failed to create azure credentials", e))?;

        let account = config.access_key.clone();
        let credentials = StorageCredentials::access_key(account.clone(), config.secret_key.clone());

        let sas_protocol = if config.endpoint.is_empty() || config.use_ssl {
            SasProtocol::Https
        } else {
            SasProtocol::HttpHttps
        };

        let builder = match config.endpoint_url() {
            Some(uri) => {
                Url::parse(&uri).map_err(|e| {
                    StorageError::construction("failed to parse endpoint URL", e)
                })?;
                ClientBuilder::with_location(
                    CloudLocation::Custom {
                        account: account.clone(),
                        uri,
                    },
                    credentials,
                )
            }
            None => ClientBuilder::new(account.clone(), credentials),
        };

        debug!(
            account = %account,
            endpoint = %config.endpoint,
            "Created Azure blob store"
        );

        Ok(Self {
            blob_service_client: builder.blob_service_client(),
            sas_protocol,
        })
    }

    fn blob_client(&self, container: &str, blob: &str) -> BlobClient {
        self.blob_service_client
            .container_client(container)
            .blob_client(blob)
    }
}

fn is_container_not_found(err: &azure_core::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::HttpResponse { error_code: Some(code), .. } if code == CONTAINER_NOT_FOUND
    )
}

#[async_trait]
impl ObjectStorage for AzureBlobStorage {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> StorageResult<()> {
        self.blob_client(bucket, key)
            .put_block_blob(Bytes::from(data))
            .await
            .map_err(|e| StorageError::transport("failed to upload blob", e))?;
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.blob_client(bucket, key)
            .get_content()
            .await
            .map_err(|e| StorageError::transport("failed to download blob", e))
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.blob_client(bucket, key)
            .delete()
            .await
            .map_err(|e| StorageError::transport("failed to delete blob", e))?;
        Ok(())
    }

    async fn presigned_url(&self, bucket: &str, key: &str, expires: Duration) -> StorageResult<Url> {
        let blob_client = self.blob_client(bucket, key);

        let start = OffsetDateTime::now_utc();
        let expiry = time::Duration::try_from(expires)
            .ok()
            .and_then(|d| start.checked_add(d))
            .ok_or_else(|| {
                StorageError::presign(format!("expiry duration {:?} is out of range", expires))
            })?;

        // Upload-only: the token can create and overwrite the blob, nothing else.
        let permissions = BlobSasPermissions {
            create: true,
            write: true,
            ..Default::default()
        };

        let sas = blob_client
            .shared_access_signature(permissions, expiry)
            .await
            .map_err(|e| StorageError::transport("failed to generate SAS query parameters", e))?
            .start(start)
            .protocol(self.sas_protocol);

        blob_client
            .generate_signed_blob_url(&sas)
            .map_err(|e| StorageError::transport("failed to build signed blob URL", e))
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        let container_client = self.blob_service_client.container_client(bucket);

        match container_client.get_properties().await {
            Ok(_) => Ok(()),
            Err(err) if is_container_not_found(&err) => {
                container_client
                    .create()
                    .public_access(PublicAccess::None)
                    .await
                    .map_err(|e| StorageError::transport("failed to create container", e))?;
                info!(container = %bucket, "Created container");
                Ok(())
            }
            Err(err) => Err(StorageError::transport(
                "failed to check container existence",
                err,
            )),
        }
    }
}
