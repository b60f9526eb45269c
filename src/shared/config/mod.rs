//! Application configuration module
//!
//! Provides the configuration types for the onboarding server. Values come
//! from environment variables (a `.env` file is loaded by the binary) and can
//! also be assembled programmatically with [`AppConfig::builder`], which is
//! what the test suite does.

use std::path::PathBuf;

use thiserror::Error;

/// Development-only signing secret used when `JWT_SECRET` is unset
const DEV_JWT_SECRET: &str = "dev-only-jwt-secret-change-me-0123456789abcdef";

/// Minimum length of the HMAC secret used to sign tokens
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// sqlx connection string
    pub database_url: String,
    /// Port the HTTP server listens on
    pub server_port: u16,
    /// HMAC secret for access and refresh tokens
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub otp_ttl_secs: u64,
    pub otp_max_attempts: u32,
    pub otp_resend_cooldown_secs: u64,
    /// How long a verified OTP can be used to complete registration
    pub otp_verified_window_secs: u64,
    /// Work factor for password and OTP hashes
    pub bcrypt_cost: u32,
    /// Root directory for uploaded registration documents
    pub upload_dir: PathBuf,
    /// Per-file upload limit in bytes
    pub max_upload_bytes: usize,
    /// SMTP relay for email OTPs; codes are only logged when absent
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://gis_portal.db?mode=rwc".to_string(),
            server_port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            otp_ttl_secs: 10 * 60,
            otp_max_attempts: 5,
            otp_resend_cooldown_secs: 60,
            otp_verified_window_secs: 30 * 60,
            bcrypt_cost: 12,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            smtp: None,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let smtp = match lookup("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                username: lookup("SMTP_USERNAME").ok_or(ConfigError::MissingValue("SMTP_USERNAME"))?,
                password: lookup("SMTP_PASSWORD").ok_or(ConfigError::MissingValue("SMTP_PASSWORD"))?,
                from: lookup("SMTP_FROM").ok_or(ConfigError::MissingValue("SMTP_FROM"))?,
            }),
            None => None,
        };

        let config = AppConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port)?,
            jwt_secret,
            access_token_ttl_secs: parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", defaults.access_token_ttl_secs)?,
            refresh_token_ttl_secs: parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", defaults.refresh_token_ttl_secs)?,
            otp_ttl_secs: parse_or(&lookup, "OTP_TTL_SECS", defaults.otp_ttl_secs)?,
            otp_max_attempts: parse_or(&lookup, "OTP_MAX_ATTEMPTS", defaults.otp_max_attempts)?,
            otp_resend_cooldown_secs: parse_or(&lookup, "OTP_RESEND_COOLDOWN_SECS", defaults.otp_resend_cooldown_secs)?,
            otp_verified_window_secs: parse_or(&lookup, "OTP_VERIFIED_WINDOW_SECS", defaults.otp_verified_window_secs)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            upload_dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            smtp,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                message: format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            });
        }
        if self.access_token_ttl_secs == 0 || self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_TTL_SECS",
                message: "refresh tokens must outlive access tokens".to_string(),
            });
        }
        if self.otp_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "OTP_MAX_ATTEMPTS",
                message: "must be at least 1".to_string(),
            });
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                message: "must be between 4 and 31".to_string(),
            });
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            message: format!("cannot parse '{}'", raw),
        }),
        None => Ok(default),
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn access_token_ttl_secs(mut self, secs: u64) -> Self {
        self.config.access_token_ttl_secs = secs;
        self
    }

    pub fn refresh_token_ttl_secs(mut self, secs: u64) -> Self {
        self.config.refresh_token_ttl_secs = secs;
        self
    }

    pub fn otp_ttl_secs(mut self, secs: u64) -> Self {
        self.config.otp_ttl_secs = secs;
        self
    }

    pub fn otp_max_attempts(mut self, attempts: u32) -> Self {
        self.config.otp_max_attempts = attempts;
        self
    }

    pub fn otp_resend_cooldown_secs(mut self, secs: u64) -> Self {
        self.config.otp_resend_cooldown_secs = secs;
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.config.bcrypt_cost = cost;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
