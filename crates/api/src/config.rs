//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOCALIZA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `LOCALIZA_TOKEN_SECRET` - HMAC key for session tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `LOCALIZA_HOST` - Bind address (default: 127.0.0.1)
//! - `LOCALIZA_PORT` - Listen port (default: 8080)
//! - `LOCALIZA_CORS_ORIGIN` - Browser origin allowed to send credentials (default: <http://localhost:3005>)
//! - `LOCALIZA_COOKIE_SECURE` - Mark the session cookie `Secure` (default: false)
//! - `LOCALIZA_REQUEST_TIMEOUT_SECS` - Per-request deadline (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const TOKEN_SECRET_VAR: &str = "LOCALIZA_TOKEN_SECRET";
const DATABASE_URL_VAR: &str = "LOCALIZA_DATABASE_URL";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3005";

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a copied-from-docs value (case-insensitive).
const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "replace",
    "todo",
    "xxx",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
///
/// `Debug` is hand-written so the database URL, token key and DSN never
/// reach the logs.
#[derive(Clone)]
pub struct ApiConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Key used to sign and verify session tokens.
    pub token_secret: SecretString,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: String,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    pub request_timeout: Duration,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("database_url", &"[REDACTED]")
            .field("socket_addr", &self.socket_addr())
            .field("token_secret", &"[REDACTED]")
            .field("cors_origin", &self.cors_origin)
            .field("cookie_secure", &self.cookie_secure)
            .field("request_timeout", &self.request_timeout)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from the process environment, reading `.env`
    /// first when one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing, a value
    /// does not parse, or the token secret is too short, looks like a
    /// placeholder or has too little entropy.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let token_secret = env
            .get(TOKEN_SECRET_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(TOKEN_SECRET_VAR.to_owned()))?;
        check_token_secret(&token_secret).map_err(|reason| {
            ConfigError::InsecureSecret(TOKEN_SECRET_VAR.to_owned(), reason)
        })?;

        Ok(Self {
            database_url: env.database_url()?,
            host: env.parse_or("LOCALIZA_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parse_or("LOCALIZA_PORT", 8080)?,
            token_secret: SecretString::from(token_secret),
            cors_origin: env
                .get("LOCALIZA_CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_owned()),
            cookie_secure: env.parse_or("LOCALIZA_COOKIE_SECURE", false)?,
            request_timeout: Duration::from_secs(
                env.parse_or("LOCALIZA_REQUEST_TIMEOUT_SECS", 30)?,
            ),
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for in-process tests: no database, a fixed token key.
    #[cfg(any(test, feature = "memory"))]
    #[must_use]
    pub fn for_tests(token_secret: &str) -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/localiza_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            token_secret: SecretString::from(token_secret),
            cors_origin: DEFAULT_CORS_ORIGIN.to_owned(),
            cookie_secure: false,
            request_timeout: Duration::from_secs(30),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Load only the database URL, for tools that never serve HTTP.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `LOCALIZA_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    let lookup = |key: &str| std::env::var(key).ok();
    Env(&lookup).database_url()
}

/// Environment access over a lookup function. Empty values count as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
        })
    }

    fn database_url(&self) -> Result<SecretString, ConfigError> {
        self.get(DATABASE_URL_VAR)
            .or_else(|| self.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_owned()))
    }
}

/// Reject token keys an attacker could guess.
fn check_token_secret(secret: &str) -> Result<(), String> {
    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_TOKEN_SECRET_LENGTH} characters (got {})",
            secret.len()
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(format!("appears to be a placeholder (contains '{marker}')"));
    }

    let entropy = bits_per_char(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }
    Ok(())
}

/// Shannon entropy of the byte distribution, in bits per character.
#[allow(clippy::cast_precision_loss)]
fn bits_per_char(s: &str) -> f64 {
    let mut counts = [0_usize; 256];
    for byte in s.bytes() {
        if let Some(slot) = counts.get_mut(usize::from(byte)) {
            *slot += 1;
        }
    }

    let len = s.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    const GOOD_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply() {
        let config = load(&[
            ("LOCALIZA_DATABASE_URL", "postgres://db/localiza"),
            ("LOCALIZA_TOKEN_SECRET", GOOD_SECRET),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
        assert!(!config.cookie_secure);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_generic_database_url_fallback() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("LOCALIZA_TOKEN_SECRET", GOOD_SECRET),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_missing_values() {
        let err = load(&[("LOCALIZA_TOKEN_SECRET", GOOD_SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == DATABASE_URL_VAR));

        let err = load(&[("DATABASE_URL", "postgres://db")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == TOKEN_SECRET_VAR));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("LOCALIZA_TOKEN_SECRET", GOOD_SECRET),
            ("LOCALIZA_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "LOCALIZA_PORT"));
    }

    #[test]
    fn test_weak_token_secrets() {
        assert!(check_token_secret("aB3$xY9!").is_err());
        assert!(check_token_secret("changeme-changeme-changeme-12345").is_err());
        assert!(check_token_secret(&"ab".repeat(20)).is_err());
        assert!(check_token_secret(GOOD_SECRET).is_ok());
    }

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!((bits_per_char("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig::for_tests(GOOD_SECRET);
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("localhost:3005"));
        assert!(!debug_output.contains("aB3$xY9!"));
        assert!(!debug_output.contains("localiza_test"));
    }
}
