//! Configuration management for the Bac Tutor backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: BAC__)
//!
//! The JWT secret has no default. It must come from a config file or
//! `BAC__JWT__SECRET`.

use anyhow::Result;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;

/// Default lifetime for tokens issued without an explicit ttl (15 minutes)
pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 900;

/// Lifetime of tokens issued by the login flow (30 minutes)
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 1800;

/// Longest token lifetime accepted from configuration (one year)
pub const MAX_TOKEN_EXPIRY_SECS: i64 = 365 * 24 * 60 * 60;

/// Minimum secret length accepted in production
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub algorithm: SigningAlgorithm,
    pub access_token_expiry_secs: i64,
    pub default_token_expiry_secs: i64,
}

impl JwtConfig {
    /// Lifetime of tokens issued by the login flow
    pub fn access_ttl(&self) -> Duration {
        ttl_from_secs(self.access_token_expiry_secs)
    }

    /// Lifetime of tokens issued without an explicit ttl
    pub fn default_ttl(&self) -> Duration {
        ttl_from_secs(self.default_token_expiry_secs)
    }
}

// Out-of-range values saturate; issuing then fails instead of panicking.
fn ttl_from_secs(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or_else(Duration::max_value)
}

/// HMAC signing algorithms accepted for session tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SigningAlgorithm {
    HS256,
    HS384,
    HS512,
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Password hashing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub scheme: PasswordScheme,
    pub bcrypt_cost: u32,
}

/// Scheme used for newly created password hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Argon2,
    Bcrypt,
}

/// User storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default)]
    pub database_url: Option<String>,
    pub max_connections: u32,
}

/// Where user records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with BAC__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let config = with_defaults(config::Config::builder())?
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (BAC__ prefix)
            // e.g., BAC__SERVER__PORT=9000 sets server.port
            .add_source(config::Environment::with_prefix("BAC").separator("__"))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration for the given secret with every other value
    /// at its default
    pub fn with_secret(secret: &str) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            jwt: JwtConfig {
                secret: SecretString::new(secret.to_string()),
                algorithm: SigningAlgorithm::HS256,
                access_token_expiry_secs: ACCESS_TOKEN_EXPIRY_SECS,
                default_token_expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
            },
            password: PasswordConfig {
                scheme: PasswordScheme::Argon2,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                max_connections: 10,
            },
        }
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.expose_secret().is_empty() {
            anyhow::bail!("jwt.secret must be set (BAC__JWT__SECRET)");
        }
        if self.jwt.access_token_expiry_secs <= 0 || self.jwt.default_token_expiry_secs <= 0 {
            anyhow::bail!("token expiry values must be positive");
        }
        if self.jwt.access_token_expiry_secs > MAX_TOKEN_EXPIRY_SECS
            || self.jwt.default_token_expiry_secs > MAX_TOKEN_EXPIRY_SECS
        {
            anyhow::bail!(
                "token expiry values must not exceed {} seconds",
                MAX_TOKEN_EXPIRY_SECS
            );
        }
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none()
        {
            anyhow::bail!("storage.database_url is required for the postgres backend");
        }
        Ok(())
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("jwt.secret", "")?
        .set_default("jwt.algorithm", "HS256")?
        .set_default("jwt.access_token_expiry_secs", ACCESS_TOKEN_EXPIRY_SECS)?
        .set_default("jwt.default_token_expiry_secs", DEFAULT_TOKEN_EXPIRY_SECS)?
        .set_default("password.scheme", "argon2")?
        .set_default("password.bcrypt_cost", bcrypt::DEFAULT_COST)?
        .set_default("storage.backend", "memory")?
        .set_default("storage.max_connections", 10)?)
}
