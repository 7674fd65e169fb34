//! Environment-driven configuration.
//!
//! Every setting has a development default so the service boots with nothing set:
//! no `DATABASE_URL` selects the in-memory store, no Cloudinary credentials select the
//! in-memory media host. Malformed values are startup errors.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";
pub const DEFAULT_MEDIA_FOLDER: &str = "file-upload";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("{key} is set but {missing} is not")]
    Missing {
        key: &'static str,
        missing: &'static str,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// `None` selects the in-memory host.
    pub cloudinary: Option<CloudinaryConfig>,
    pub folder: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt_secret: String,
    pub media: MediaConfig,
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database)
            .field("jwt_secret", &"<redacted>")
            .field("media", &self.media)
            .finish()
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_or("BIND_ADDR", var("BIND_ADDR"), DEFAULT_BIND_ADDR)?;

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    var("DATABASE_MAX_CONNECTIONS"),
                    &DEFAULT_MAX_CONNECTIONS.to_string(),
                )?,
                acquire_timeout_secs: parse_or(
                    "DATABASE_ACQUIRE_TIMEOUT_SECS",
                    var("DATABASE_ACQUIRE_TIMEOUT_SECS"),
                    &DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string(),
                )?,
            }),
            None => {
                warn!("DATABASE_URL not set, using the in-memory catalog store");
                None
            }
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let cloudinary = match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                base_url: var("CLOUDINARY_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            (None, None, None) => {
                warn!("Cloudinary credentials not set, using the in-memory media host");
                None
            }
            (cloud, key, _) => {
                let missing = if cloud.is_none() {
                    "CLOUDINARY_CLOUD_NAME"
                } else if key.is_none() {
                    "CLOUDINARY_API_KEY"
                } else {
                    "CLOUDINARY_API_SECRET"
                };
                return Err(ConfigError::Missing {
                    key: "CLOUDINARY_*",
                    missing,
                });
            }
        };

        let folder = var("MEDIA_FOLDER").unwrap_or_else(|| DEFAULT_MEDIA_FOLDER.to_string());

        Ok(Self {
            bind_addr,
            database,
            jwt_secret,
            media: MediaConfig { cloudinary, folder },
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = raw.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
