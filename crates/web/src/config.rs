//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (`CAT_COLLECTOR_DATABASE_URL` takes precedence)
//! - `OBJECT_STORAGE_BUCKET` - Bucket that cat photos are uploaded into
//! - `OBJECT_STORAGE_BASE_URL` - Public base URL photos are served from
//!
//! ## Optional
//! - `CAT_COLLECTOR_HOST` - Bind address (default: 127.0.0.1)
//! - `CAT_COLLECTOR_PORT` - Listen port (default: 8000)
//! - `CAT_COLLECTOR_BASE_URL` - Public URL of the app (default: `http://localhost:8000`)
//! - `CAT_COLLECTOR_OWNERSHIP_SCOPED` - Restrict cats to their owner (default: true)
//! - `FEEDING_VALIDATION_POLICY` - `drop` or `reject` invalid feedings (default: drop)
//! - `PHOTO_UPLOAD_POLICY` - `swallow` or `surface` upload failures (default: swallow)
//! - `OBJECT_STORAGE_ENDPOINT` - Upload API base URL (default: `OBJECT_STORAGE_BASE_URL`)
//! - `OBJECT_STORAGE_TOKEN` - Bearer token for the upload API
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::storage::object_url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// What to do when a best-effort operation fails.
///
/// Applies to invalid feeding submissions and failed photo uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and carry on as if nothing happened.
    #[default]
    Silent,
    /// Return the failure to the client as an error response.
    Surface,
}

impl FailurePolicy {
    /// Parse a policy name.
    ///
    /// `drop`, `swallow` and `silent` select [`FailurePolicy::Silent`];
    /// `reject` and `surface` select [`FailurePolicy::Surface`].
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" | "swallow" | "silent" => Some(Self::Silent),
            "reject" | "surface" => Some(Self::Surface),
            _ => None,
        }
    }
}

/// Cat Collector application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the app
    pub base_url: String,
    /// Whether cats are only visible to their owner
    pub ownership_scoped: bool,
    /// Handling of invalid feeding submissions
    pub feeding_policy: FailurePolicy,
    /// Handling of failed photo uploads
    pub upload_policy: FailurePolicy,
    /// Object storage for cat photos
    pub storage: ObjectStorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Object storage configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ObjectStorageConfig {
    /// Bucket photos are uploaded into
    pub bucket: String,
    /// Public base URL objects are served from
    pub base_url: String,
    /// Base URL of the upload API
    pub endpoint: String,
    /// Bearer token for the upload API
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ObjectStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorageConfig")
            .field("bucket", &self.bucket)
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the storage token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CAT_COLLECTOR_DATABASE_URL")?;
        let host = get_env_or_default("CAT_COLLECTOR_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CAT_COLLECTOR_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("CAT_COLLECTOR_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CAT_COLLECTOR_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("CAT_COLLECTOR_BASE_URL", "http://localhost:8000");
        let ownership_scoped = get_bool_env("CAT_COLLECTOR_OWNERSHIP_SCOPED", true)?;
        let feeding_policy = get_policy_env("FEEDING_VALIDATION_POLICY")?;
        let upload_policy = get_policy_env("PHOTO_UPLOAD_POLICY")?;

        let storage = ObjectStorageConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            ownership_scoped,
            feeding_policy,
            upload_policy,
            storage,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ObjectStorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bucket = get_required_env("OBJECT_STORAGE_BUCKET")?;
        if bucket.trim().is_empty() || bucket.contains('/') {
            return Err(ConfigError::InvalidEnvVar(
                "OBJECT_STORAGE_BUCKET".to_string(),
                "must be a non-empty bucket name without '/'".to_string(),
            ));
        }

        let base_url = get_http_url("OBJECT_STORAGE_BASE_URL")?;
        let endpoint = if get_optional_env("OBJECT_STORAGE_ENDPOINT").is_some() {
            get_http_url("OBJECT_STORAGE_ENDPOINT")?
        } else {
            base_url.clone()
        };

        let token = match get_optional_env("OBJECT_STORAGE_TOKEN") {
            Some(value) => {
                validate_secret_strength(&value, "OBJECT_STORAGE_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            bucket,
            base_url,
            endpoint,
            token,
        })
    }

    /// Public URL of an object in the configured bucket.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        object_url(&self.base_url, &self.bucket, key)
    }

    /// Borrow the bearer token, if one is configured.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(ExposeSecret::expose_secret)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean environment variable with a default value.
fn get_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| parse_bool(&value, key))
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Get a failure policy environment variable (default: silent).
fn get_policy_env(key: &str) -> Result<FailurePolicy, ConfigError> {
    get_optional_env(key).map_or(Ok(FailurePolicy::default()), |value| {
        FailurePolicy::parse(&value).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unknown policy '{value}' (expected drop/swallow or reject/surface)"),
            )
        })
    })
}

/// Get a required absolute http(s) URL.
fn get_http_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    validate_http_url(&value, key)?;
    Ok(value)
}

fn validate_http_url(value: &str, key: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
