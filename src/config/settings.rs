//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_FRONTEND_URL, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_REDIS_URL,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_STORAGE_BUCKET, DEFAULT_STORAGE_ENDPOINT,
    DEFAULT_STORAGE_LOCAL_PATH, DEFAULT_STORAGE_REGION, MIN_JWT_SECRET_LENGTH,
};

/// Where listing images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// S3-compatible bucket (AWS, MinIO, R2...)
    S3,
    /// Directory on the local filesystem
    Local,
}

impl From<&str> for StorageBackend {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        }
    }
}

/// Object storage settings.
#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Public endpoint, used for `{endpoint}/{bucket}/{key}` URLs
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    pub local_path: String,
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            backend: env::var("STORAGE_BACKEND")
                .map(|v| StorageBackend::from(v.as_str()))
                .unwrap_or(StorageBackend::Local),
            endpoint: env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_STORAGE_ENDPOINT.to_string()),
            bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
            region: env::var("STORAGE_REGION")
                .unwrap_or_else(|_| DEFAULT_STORAGE_REGION.to_string()),
            access_key_id: env::var("STORAGE_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("STORAGE_SECRET_ACCESS_KEY").ok(),
            local_path: env::var("STORAGE_LOCAL_PATH")
                .unwrap_or_else(|_| DEFAULT_STORAGE_LOCAL_PATH.to_string()),
        }
    }

    pub fn access_key_id(&self) -> Option<&str> {
        self.access_key_id.as_deref()
    }

    pub fn secret_access_key(&self) -> Option<&str> {
        self.secret_access_key.as_deref()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub frontend_url: String,
    pub rate_limit_enabled: bool,
    pub storage: StorageConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("frontend_url", &self.frontend_url)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .field("storage_backend", &self.storage.backend)
            .field("storage_bucket", &self.storage.bucket)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            storage: StorageConfig::from_env(),
        }
    }

    /// Build a configuration directly from a secret (tests, tooling).
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            rate_limit_enabled: false,
            storage: StorageConfig {
                backend: StorageBackend::Local,
                endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
                bucket: DEFAULT_STORAGE_BUCKET.to_string(),
                region: DEFAULT_STORAGE_REGION.to_string(),
                access_key_id: None,
                secret_access_key: None,
                local_path: DEFAULT_STORAGE_LOCAL_PATH.to_string(),
            },
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
