//! Error types for object storage operations.

use std::error::Error as StdError;

/// Boxed cause carried by transport and construction errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for object storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while building a client or running an operation.
///
/// A missing object is reported as a [`StorageError::Transport`] like any
/// other provider failure; callers that need to tell them apart must
/// inspect the source.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The provider tag is not one of `aws`, `gcp` or `azure`.
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// The SDK client or credential object could not be built.
    #[error("{context}: {source}")]
    Construction {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    /// The configuration is structurally unusable.
    #[error("invalid storage config: {reason}")]
    InvalidConfig { reason: String },

    /// Network or SDK failure, prefixed with the failing step.
    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    /// Presigned URL inputs were rejected before signing.
    #[error("presigned URL generation error: {reason}")]
    Presign { reason: String },

    /// The caller cancelled the operation.
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
}

impl StorageError {
    pub fn construction(context: &'static str, source: impl Into<BoxError>) -> Self {
        StorageError::Construction {
            context,
            source: source.into(),
        }
    }

    pub fn transport(context: &'static str, source: impl Into<BoxError>) -> Self {
        StorageError::Transport {
            context,
            source: source.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        StorageError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn presign(reason: impl Into<String>) -> Self {
        StorageError::Presign {
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StorageError::Cancelled { .. })
    }
}

impl From<figment::Error> for StorageError {
    fn from(err: figment::Error) -> Self {
        StorageError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_keeps_context_and_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = StorageError::transport("failed to upload object", io);

        assert_eq!(err.to_string(), "failed to upload object: connection reset");
        assert!(err.source().is_some());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_unsupported_provider_names_value() {
        let err = StorageError::UnsupportedProvider {
            provider: "unknown".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported provider: unknown");
    }

    #[test]
    fn test_cancelled() {
        let err = StorageError::Cancelled {
            operation: "download",
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "download cancelled");
    }
}
