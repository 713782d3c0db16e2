//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SML_BASE_URL` - Public URL for the storefront
//! - `FIREBASE_DATABASE_URL` - Realtime Database URL (when `STORE_BACKEND=firebase`)
//!
//! ## Optional
//! - `SML_HOST` - Bind address (default: 127.0.0.1)
//! - `SML_PORT` - Listen port (default: 3000)
//! - `STORE_BACKEND` - `firebase` or `memory` (default: firebase)
//! - `FIREBASE_AUTH_TOKEN` - Database secret or ID token appended as `auth`
//! - `SEARCH_API_URL` - Product search API (default: <https://smlgoapi.dedepos.com>)
//! - `STORE_UTC_OFFSET` - Offset used for order dates (default: +07:00)
//! - `SHOP_NAME`, `SHOP_ADDRESS`, `SHOP_PHONE`, `SHOP_EMAIL`, `SHOP_TAX_ID` -
//!   Seller block printed on quotations
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of transactions traced (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use sml_market_core::Party;
use thiserror::Error;

const DEFAULT_SEARCH_API_URL: &str = "https://smlgoapi.dedepos.com";
const DEFAULT_UTC_OFFSET: &str = "+07:00";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Document store backend
    pub store: StoreConfig,
    /// Base URL of the product search API
    pub search_api_url: String,
    /// Offset of the shop's local time, used for order dates
    pub utc_offset: FixedOffset,
    /// Seller details printed on quotations
    pub shop: Party,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Which document store to use.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub enum StoreConfig {
    /// Firebase Realtime Database over REST.
    Firebase {
        database_url: String,
        auth_token: Option<SecretString>,
    },
    /// Process-local tree, lost on restart.
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Firebase {
                database_url,
                auth_token,
            } => f
                .debug_struct("Firebase")
                .field("database_url", database_url)
                .field("auth_token", &auth_token.as_ref().map(|_| "[REDACTED]"))
                .finish(),
            Self::Memory => f.write_str("Memory"),
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
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Firebase token fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SML_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SML_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SML_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SML_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SML_BASE_URL")?;

        let store = StoreConfig::from_env()?;
        let search_api_url = get_env_or_default("SEARCH_API_URL", DEFAULT_SEARCH_API_URL)
            .trim_end_matches('/')
            .to_owned();
        let utc_offset = utc_offset_from_env()?;
        let shop = shop_from_env();

        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")
            .parse::<f32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENTRY_TRACES_SAMPLE_RATE".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            base_url,
            store,
            search_api_url,
            utc_offset,
            shop,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for running against the in-memory store.
    ///
    /// Used by tests and local demos; nothing is read from the environment.
    #[must_use]
    pub fn in_memory(search_api_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost:3000".to_owned(),
            store: StoreConfig::Memory,
            search_api_url: search_api_url.trim_end_matches('/').to_owned(),
            utc_offset: parse_utc_offset(DEFAULT_UTC_OFFSET).unwrap_or_else(|_| Utc.fix()),
            shop: Party {
                name: "SML Market".to_owned(),
                ..Party::default()
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StoreConfig {
    /// Read the store backend from `STORE_BACKEND` and the `FIREBASE_*`
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown, the database URL is
    /// missing or invalid, or the auth token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("STORE_BACKEND", "firebase").as_str() {
            "memory" => Ok(Self::Memory),
            "firebase" => {
                let database_url = get_required_env("FIREBASE_DATABASE_URL")?;
                url::Url::parse(&database_url).map_err(|e| {
                    ConfigError::InvalidEnvVar("FIREBASE_DATABASE_URL".to_string(), e.to_string())
                })?;
                let auth_token = get_optional_env("FIREBASE_AUTH_TOKEN")
                    .map(|token| {
                        validate_secret_strength(&token, "FIREBASE_AUTH_TOKEN")?;
                        Ok::<_, ConfigError>(SecretString::from(token))
                    })
                    .transpose()?;
                Ok(Self::Firebase {
                    database_url,
                    auth_token,
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "STORE_BACKEND".to_string(),
                format!("expected 'firebase' or 'memory', got '{other}'"),
            )),
        }
    }
}

/// Read `STORE_UTC_OFFSET` (default `+07:00`).
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the offset cannot be parsed.
pub fn utc_offset_from_env() -> Result<FixedOffset, ConfigError> {
    parse_utc_offset(&get_env_or_default("STORE_UTC_OFFSET", DEFAULT_UTC_OFFSET))
        .map_err(|e| ConfigError::InvalidEnvVar("STORE_UTC_OFFSET".to_string(), e))
}

fn shop_from_env() -> Party {
    Party {
        name: get_env_or_default("SHOP_NAME", "SML Market"),
        address: get_env_or_default("SHOP_ADDRESS", ""),
        phone: get_env_or_default("SHOP_PHONE", ""),
        email: get_env_or_default("SHOP_EMAIL", ""),
        tax_id: get_env_or_default("SHOP_TAX_ID", ""),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
///
/// # Errors
///
/// Returns a description of the problem if `value` is not a valid offset.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value == "UTC" {
        return FixedOffset::east_opt(0).ok_or_else(|| "offset out of range".to_owned());
    }

    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("expected +HH:MM or -HH:MM, got '{value}'")),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected +HH:MM or -HH:MM, got '{value}'"))?;
    let hours: i32 = hours
        .parse()
        .map_err(|_| format!("invalid hours in '{value}'"))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| format!("invalid minutes in '{value}'"))?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(format!("offset '{value}' out of range"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset '{value}' out of range"))
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the generated database secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-database-secret", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("Xk9vQ2mL7pR4tZ8wB3nF6hJ1", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("+07:00").unwrap(),
            FixedOffset::east_opt(7 * 3600).unwrap()
        );
        assert_eq!(
            parse_utc_offset("-05:30").unwrap(),
            FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert_eq!(parse_utc_offset("Z").unwrap(), FixedOffset::east_opt(0).unwrap());
        assert!(parse_utc_offset("07:00").is_err());
        assert!(parse_utc_offset("+7").is_err());
        assert!(parse_utc_offset("+24:00").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = StorefrontConfig::in_memory("http://localhost:9");
        config.port = 3000;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_store_config_debug_redacts_token() {
        let config = StoreConfig::Firebase {
            database_url: "https://sml.firebaseio.com".to_string(),
            auth_token: Some(SecretString::from("super_secret_token")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("sml.firebaseio.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
