//! Authentication Engine Configuration
//!
//! Builder-pattern configuration for the authentication core. Configuration
//! is read once at process start and is immutable thereafter; every component
//! (codec, hasher, service) borrows from the same loaded value.
//!
//! # Example
//!
//! ```ignore
//! use portcullis::AuthConfig;
//!
//! // Load from environment variables
//! let config = AuthConfig::from_env()?;
//!
//! // Or build programmatically
//! let config = AuthConfig::builder()
//!     .secret(my_secret)
//!     .access_token_ttl(Duration::from_secs(10 * 60))
//!     .bcrypt_cost(10)
//!     .build();
//! ```

use std::fmt;
use std::time::Duration;

use crate::secret::{SecretError, SecretPolicy};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the authentication engine.
///
/// Holds the signing secret and the three tunable knobs of the protocol:
/// access-token lifetime, refresh-token lifetime, and password hashing cost.
#[derive(Clone)]
pub struct AuthConfig {
    /// Symmetric signing secret for access and refresh tokens
    pub secret: String,

    /// Access token lifetime (default: 15 minutes)
    pub access_token_ttl: Duration,

    /// Refresh token lifetime (default: 14 days)
    pub refresh_token_ttl: Duration,

    /// bcrypt cost factor for password hashing (default: 12)
    pub bcrypt_cost: u32,
}

// Manual Debug so the signing secret never lands in logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Error loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `AUTH_SECRET` is not set
    #[error("AUTH_SECRET environment variable is required")]
    MissingSecret,

    /// The signing secret failed strength validation
    #[error("signing secret rejected: {0}")]
    WeakSecret(#[from] SecretError),

    /// An environment variable could not be parsed
    #[error("invalid value for {variable}: {value}")]
    InvalidValue { variable: String, value: String },
}

impl AuthConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_SECRET`: signing secret (required, validated against
    ///   [`SecretPolicy::default`])
    /// - `ACCESS_TOKEN_TTL_MINUTES`: access token lifetime (default: 15)
    /// - `REFRESH_TOKEN_TTL_DAYS`: refresh token lifetime (default: 14)
    /// - `BCRYPT_COST`: password hashing cost factor (default: 12)
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("AUTH_SECRET").map_err(|_| ConfigError::MissingSecret)?;
        SecretPolicy::default().validate(&secret)?;

        let access_minutes = read_env_u64("ACCESS_TOKEN_TTL_MINUTES", 15)?;
        let refresh_days = read_env_u64("REFRESH_TOKEN_TTL_DAYS", 14)?;
        let bcrypt_cost = read_env_u64("BCRYPT_COST", 12)? as u32;

        Ok(Self {
            secret,
            access_token_ttl: Duration::from_secs(access_minutes * 60),
            refresh_token_ttl: Duration::from_secs(refresh_days * 24 * 60 * 60),
            bcrypt_cost,
        })
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Validate the signing secret against a policy.
    ///
    /// `from_env` applies the default policy automatically; call this with
    /// [`SecretPolicy::strict`] when loading production key material by hand.
    pub fn validate_secret(&self, policy: &SecretPolicy) -> Result<(), SecretError> {
        policy.validate(&self.secret)
    }
}

fn read_env_u64(variable: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(variable) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            variable: variable.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`AuthConfig`]
#[derive(Debug, Clone)]
pub struct AuthConfigBuilder {
    secret: String,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    bcrypt_cost: u32,
}

impl Default for AuthConfigBuilder {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(14 * 24 * 60 * 60),
            bcrypt_cost: 12,
        }
    }
}

impl AuthConfigBuilder {
    /// Set the signing secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Set the access token lifetime.
    pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime.
    pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    /// Set the bcrypt cost factor.
    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AuthConfig {
        AuthConfig {
            secret: self.secret,
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::generate_secret;

    #[test]
    fn test_builder_defaults() {
        let config = AuthConfig::builder().secret("s").build();
        assert_eq!(config.access_token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(14 * 24 * 60 * 60));
        assert_eq!(config.bcrypt_cost, 12);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AuthConfig::builder()
            .secret("s")
            .access_token_ttl(Duration::from_secs(60))
            .refresh_token_ttl(Duration::from_secs(3600))
            .bcrypt_cost(4)
            .build();

        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_secret_validation() {
        let good = AuthConfig::builder().secret(generate_secret(64)).build();
        assert!(good.validate_secret(&SecretPolicy::default()).is_ok());

        let bad = AuthConfig::builder().secret("short").build();
        assert!(bad.validate_secret(&SecretPolicy::default()).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig::builder().secret("super-sensitive").build();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-sensitive"));
        assert!(rendered.contains("<redacted>"));
    }
}
