//! Object storage configuration.

use std::{fmt, path::Path, str::FromStr};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de::{self, Visitor},
};

use crate::{StorageError, StorageResult};

/// Environment variable prefix used by [`StorageConfig::from_env`].
pub const ENV_PREFIX: &str = "S3_";

/// Cloud storage provider a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Aws,
    Gcp,
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            "azure" => Ok(Provider::Azure),
            other => Err(StorageError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

impl Serialize for Provider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Connection settings for one object storage provider.
///
/// For `aws` and `gcp` the keys are an HMAC access key pair and `endpoint`
/// is the S3 API host (`storage.googleapis.com` for GCS interoperability).
/// For `azure`, `access_key` is the storage account name and `secret_key`
/// the base64 account key.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub provider: Provider,

    /// Host (and optional port) without a scheme. Empty selects the
    /// provider's public endpoint.
    #[serde(default, deserialize_with = "string_or_number")]
    pub endpoint: String,

    #[serde(deserialize_with = "string_or_number")]
    pub access_key: String,

    #[serde(deserialize_with = "string_or_number")]
    pub secret_key: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub region: String,

    #[serde(default = "default_use_ssl", alias = "secure")]
    pub use_ssl: bool,
}

fn default_use_ssl() -> bool {
    true
}

/// Keys whose environment values are taken verbatim instead of being parsed
/// as figment values, so `S3_ACCESS_KEY=007` stays `"007"`.
const VERBATIM_ENV_KEYS: &[&str] = &["endpoint", "access_key", "secret_key", "region"];

/// Accepts numbers where a string is expected. YAML reads an unquoted
/// all-digit account name or key as an integer.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

impl StorageConfig {
    /// Load the config from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> StorageResult<StorageConfig> {
        let config: StorageConfig = Figment::new()
            .merge(Yaml::file_exact(path.as_ref()))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from `S3_*` environment variables.
    pub fn from_env() -> StorageResult<StorageConfig> {
        let config: StorageConfig = Self::figment(None).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Figment with an optional YAML file overlaid by the environment.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(VERBATIM_ENV_KEYS));
        for (key, value) in Env::prefixed(ENV_PREFIX).only(VERBATIM_ENV_KEYS).iter() {
            figment = figment.merge(Serialized::default(key.as_str(), value));
        }
        figment
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.access_key.is_empty() {
            return Err(StorageError::invalid_config("access_key must be set"));
        }
        if self.secret_key.is_empty() {
            return Err(StorageError::invalid_config("secret_key must be set"));
        }
        if self.endpoint.contains("://") {
            return Err(StorageError::invalid_config(format!(
                "endpoint must be a host without a scheme: {}",
                self.endpoint
            )));
        }
        Ok(())
    }

    /// Scheme-qualified endpoint, or `None` when the public one is used.
    pub(crate) fn endpoint_url(&self) -> Option<String> {
        if self.endpoint.is_empty() {
            return None;
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        Some(format!("{}://{}", scheme, self.endpoint))
    }
}
