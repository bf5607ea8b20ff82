//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VITRINE_API_URL` - Base URL of the commerce API (e.g., `https://api.example.com`)
//!
//! ## Optional
//! - `VITRINE_API_EMAIL` - Panel user email used to sign in
//! - `VITRINE_API_PASSWORD` - Panel user password (set together with the email)
//! - `VITRINE_API_TOKEN` - Pre-issued JWT, used instead of signing in
//! - `VITRINE_SHIPPING_PROVIDER` - Shipping quote provider (default: correios)
//! - `VITRINE_REQUEST_TIMEOUT_SECS` - HTTP timeout (default: 30)
//! - `VITRINE_CACHE_TTL_SECS` - Query cache time-to-live (default: 300)
//! - `VITRINE_DEBOUNCE_MS` - Delay before remote field checks run (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SHIPPING_PROVIDER: &str = "correios";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Values left over from env templates (case-insensitive, whole value)
const PLACEHOLDER_VALUES: &[&str] = &[
    "changeme",
    "replace-me",
    "placeholder",
    "password",
    "secret",
    "xxx",
    "todo",
    "fixme",
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Commerce API connection settings
    pub api: ApiConfig,
    /// Sign-in credentials (optional when a token is provided)
    pub credentials: Option<Credentials>,
    /// Pre-issued bearer token
    pub api_token: Option<SecretString>,
    /// Delay applied to debounced remote checks
    pub debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Commerce API connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API base URL, always ending in `/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Query cache time-to-live
    pub cache_ttl: Duration,
    /// Provider segment for `/logistics/shipping/:provider`
    pub shipping_provider: String,
}

impl ApiConfig {
    /// Build a config for a base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            shipping_provider: DEFAULT_SHIPPING_PROVIDER.to_string(),
        })
    }
}

/// Panel sign-in credentials.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Credentials {
    /// Panel user email
    pub email: String,
    /// Panel user password
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let email = get_optional_env("VITRINE_API_EMAIL");
        let password = get_optional_env("VITRINE_API_PASSWORD");

        match (email, password) {
            (Some(email), Some(password)) => {
                reject_placeholder(&password, "VITRINE_API_PASSWORD")?;
                Ok(Some(Self {
                    email,
                    password: SecretString::from(password),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "VITRINE_API_*".to_string(),
                "Both VITRINE_API_EMAIL and VITRINE_API_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, numbers do not
    /// parse, or the password looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(&get_required_env("VITRINE_API_URL")?)?;
        let timeout = Duration::from_secs(get_parsed_env(
            "VITRINE_REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let cache_ttl = Duration::from_secs(get_parsed_env(
            "VITRINE_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL_SECS,
        )?);
        let debounce =
            Duration::from_millis(get_parsed_env("VITRINE_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?);
        let shipping_provider =
            get_env_or_default("VITRINE_SHIPPING_PROVIDER", DEFAULT_SHIPPING_PROVIDER);

        let credentials = Credentials::from_env()?;
        let api_token = get_optional_env("VITRINE_API_TOKEN").map(SecretString::from);

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout,
                cache_ttl,
                shipping_provider,
            },
            credentials,
            api_token,
            debounce,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }

    /// Whether the config can produce an authenticated session.
    #[must_use]
    pub const fn can_authenticate(&self) -> bool {
        self.credentials.is_some() || self.api_token.is_some()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so `Url::join` keeps the
/// path prefix (`https://host/api/` + `carts` = `https://host/api/carts`).
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "VITRINE_API_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a numeric environment variable with a default value.
fn get_parsed_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |v| {
        v.parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject a value that was copied from an env template unchanged.
///
/// Only the whole value is matched.
fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.trim().to_lowercase();
    let templated = lower.starts_with("your-") || (lower.starts_with('<') && lower.ends_with('>'));
    if templated || PLACEHOLDER_VALUES.contains(&lower.as_str()) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "appears to be a placeholder".to_string(),
        ));
    }
    Ok(())
}
