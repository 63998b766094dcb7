//! Expiry limits shared by the presigned URL generators.

use std::time::Duration;

use crate::{StorageError, StorageResult};

/// Maximum presigned URL expiry (7 days for both SigV4 and GOOG4).
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Validate presigned URL expiry duration.
pub fn validate_expiry(expires_in: Duration) -> StorageResult<()> {
    if expires_in > MAX_PRESIGN_EXPIRY {
        Err(StorageError::presign(format!(
            "expiry duration {:?} exceeds maximum allowed {:?}",
            expires_in, MAX_PRESIGN_EXPIRY
        )))
    } else if expires_in.as_secs() == 0 {
        Err(StorageError::presign(
            "expiry duration must be at least one second",
        ))
    } else {
        Ok(())
    }
}
