//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRUFFLE_API_BASE_URL` - Base URL of the shop API (e.g., `https://truffle.shop`)
//!
//! ## Optional
//! - `TRUFFLE_STATE_DIR` - Directory for persisted cart/session state (default: `.truffle`)
//! - `TRUFFLE_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 15)
//! - `TRUFFLE_CATALOG_CACHE_SECS` - Product list cache TTL, 0 disables (default: 60)
//! - `TRUFFLE_DELIVERY_DAYS` - Comma-separated delivery weekdays (default: `Saturday,Sunday`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use truffle_core::DeliveryDays;

const DEFAULT_STATE_DIR: &str = ".truffle";
const DEFAULT_TIMEOUT_SECS: &str = "15";
const DEFAULT_CATALOG_CACHE_SECS: &str = "60";
const DEFAULT_DELIVERY_DAYS: &str = "Saturday,Sunday";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop API connection settings
    pub api: ApiConfig,
    /// Directory for the file-backed key-value store
    pub state_dir: PathBuf,
    /// Weekdays on which deliveries are made
    pub delivery_days: DeliveryDays,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shop API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the API (paths like `/api/login` are appended)
    pub base_url: Url,
    /// Upper bound on each request, including reading the body
    pub timeout: Duration,
    /// How long the product list is cached; zero disables caching
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Settings for `base_url` with default timeout and caching.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            catalog_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url("TRUFFLE_API_BASE_URL", &get_required_env("TRUFFLE_API_BASE_URL")?)?;
        let timeout = parse_secs(
            "TRUFFLE_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("TRUFFLE_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        )?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "TRUFFLE_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let catalog_cache_ttl = parse_secs(
            "TRUFFLE_CATALOG_CACHE_SECS",
            &get_env_or_default("TRUFFLE_CATALOG_CACHE_SECS", DEFAULT_CATALOG_CACHE_SECS),
        )?;
        let delivery_days = get_env_or_default("TRUFFLE_DELIVERY_DAYS", DEFAULT_DELIVERY_DAYS)
            .parse::<DeliveryDays>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TRUFFLE_DELIVERY_DAYS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout,
                catalog_cache_ttl,
            },
            state_dir: PathBuf::from(get_env_or_default("TRUFFLE_STATE_DIR", DEFAULT_STATE_DIR)),
            delivery_days,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute `http`/`https` base URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL must have a host".to_string(),
        ));
    }
    Ok(url)
}

/// Parse a whole number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
