//! Provider-neutral object storage client.
//!
//! One [`ObjectStorageClient`] talks to exactly one provider, chosen from
//! [`StorageConfig::provider`]:
//!
//! - `aws`: S3 or any SigV4-compatible endpoint (MinIO, Ceph, ...)
//! - `gcp`: Google Cloud Storage through its S3 interoperability API, with
//!   presigned URLs signed as GOOG4-HMAC-SHA256
//! - `azure`: Azure Blob Storage, with SAS tokens as presigned URLs
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use objstorage::{ObjectStorageClient, StorageConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), objstorage::StorageError> {
//! let config = StorageConfig::from_env()?;
//! let client = ObjectStorageClient::new(config)?;
//! let cancel = CancellationToken::new();
//!
//! client.make_bucket(&cancel, "uploads").await?;
//! client
//!     .upload(&cancel, "uploads", "hello.txt", b"hello".to_vec())
//!     .await?;
//!
//! // Hand this to a third party so it can PUT the object directly.
//! let url = client
//!     .presigned_url(&cancel, "uploads", "report.pdf", Duration::from_secs(900))
//!     .await?;
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod presign;
pub mod signing;

pub use backends::{azure::AzureBlobStorage, s3::S3CompatibleStorage};
pub use client::{ObjectStorage, ObjectStorageClient};
pub use config::{Provider, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use metrics::StorageMetrics;
pub use presign::{MAX_PRESIGN_EXPIRY, validate_expiry};
pub use signing::{GcsV4Signer, SignOptions};
