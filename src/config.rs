use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read from the environment (after `.env` has been
/// loaded by the binary).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub token_ttl_hours: i64,
    pub bootstrap_admin_email: Option<String>,
    pub media: MediaConfig,
    pub max_page_size: u64,
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub base_url: String,
    pub gcs_bucket: Option<String>,
    pub max_upload_bytes: usize,
    pub upload_concurrency: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./media"),
            base_url: "/media".to_string(),
            gcs_bucket: None,
            max_upload_bytes: 10 * 1024 * 1024,
            upload_concurrency: 4,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let defaults = MediaConfig::default();

        Ok(Self {
            database_url,
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3003".to_string()),
            token_ttl_hours: parsed("TOKEN_TTL_HOURS", 12)?,
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            media: MediaConfig {
                root: env::var("MEDIA_ROOT").map(PathBuf::from).unwrap_or(defaults.root),
                base_url: env::var("MEDIA_BASE_URL").unwrap_or(defaults.base_url),
                gcs_bucket: env::var("GCS_BUCKET_NAME").ok().filter(|b| !b.is_empty()),
                max_upload_bytes: parsed("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
                upload_concurrency: parsed("UPLOAD_CONCURRENCY", defaults.upload_concurrency)?
                    .max(1),
            },
            max_page_size: parsed("MAX_PAGE_SIZE", 100)?,
        })
    }

    /// Configuration for tests and tools that already hold a connection.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origin: "http://localhost:3003".to_string(),
            token_ttl_hours: 12,
            bootstrap_admin_email: None,
            media: MediaConfig::default(),
            max_page_size: 100,
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
