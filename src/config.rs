use std::{fmt, path::PathBuf, time::Duration};

use crate::domain::errors::{ClientError, ClientResult};

pub const DEFAULT_REGION: &str = "us-east-1";

pub const ENV_ENDPOINT: &str = "STORE_ENDPOINT";
pub const ENV_ACCESS_KEY: &str = "STORE_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "STORE_SECRET_KEY";
pub const ENV_BUCKET: &str = "STORE_BUCKET";
pub const ENV_REGION: &str = "STORE_REGION";
pub const ENV_TEMP_DIR: &str = "STORE_TEMP_DIR";
pub const ENV_TIMEOUT_SECS: &str = "STORE_TIMEOUT_SECS";

/// Configuration for a [`StoreClient`](crate::StoreClient)
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend address as `host[:port]`; TLS is always used
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Directory for `object_to_tempfile`
    pub temp_dir: PathBuf,
    /// Per-request timeout applied by the HTTP transport
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_string(),
            temp_dir: std::env::temp_dir(),
            request_timeout: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Load configuration from the environment, reading a `.env` file first if present
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ClientError::Configuration {
                    message: format!("{} environment variable required", name),
                })
        };

        let mut config = Self::new(
            required(ENV_ENDPOINT)?,
            required(ENV_ACCESS_KEY)?,
            required(ENV_SECRET_KEY)?,
            required(ENV_BUCKET)?,
        );

        if let Some(region) = lookup(ENV_REGION).filter(|v| !v.is_empty()) {
            config.region = region;
        }

        if let Some(temp_dir) = lookup(ENV_TEMP_DIR).filter(|v| !v.is_empty()) {
            config.temp_dir = PathBuf::from(temp_dir);
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.is_empty()) {
            let secs: u64 = secs.parse().map_err(|_| ClientError::Configuration {
                message: format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, secs),
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("temp_dir", &self.temp_dir)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
