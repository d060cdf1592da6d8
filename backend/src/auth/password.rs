//! Password hashing using argon2 or bcrypt
//!
//! New hashes use the configured scheme. Verification reads the scheme
//! back from the stored hash prefix, so records hashed with bcrypt keep
//! verifying after the service switches to argon2 and vice versa.
//!
//! # Performance Considerations
//!
//! Both schemes are intentionally CPU-intensive. Async callers should use
//! the `*_async` variants, which run on the blocking thread pool.

use crate::config::{PasswordConfig, PasswordScheme};
use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing service
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    scheme: PasswordScheme,
    bcrypt_cost: u32,
}

impl PasswordService {
    pub fn new(config: &PasswordConfig) -> Self {
        Self {
            scheme: config.scheme,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Argon2id with default parameters
    pub fn argon2() -> Self {
        Self {
            scheme: PasswordScheme::Argon2,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Bcrypt with the given cost
    pub fn bcrypt(cost: u32) -> Self {
        Self {
            scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: cost,
        }
    }

    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }

    /// Hash a password with a fresh random salt (blocking operation)
    pub fn hash(&self, password: &str) -> Result<String> {
        match self.scheme {
            PasswordScheme::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
                Ok(hash.to_string())
            }
            PasswordScheme::Bcrypt => bcrypt::hash(password, self.bcrypt_cost)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e)),
        }
    }

    /// Hash a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool,
    /// preventing it from blocking the async runtime.
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored hash (blocking operation)
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only when the stored hash
    /// itself cannot be parsed.
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        match detect_scheme(hash) {
            Some(PasswordScheme::Argon2) => {
                let parsed_hash = PasswordHash::new(hash)
                    .map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
                Ok(Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok())
            }
            Some(PasswordScheme::Bcrypt) => bcrypt::verify(password, hash)
                .map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e)),
            None => Err(anyhow::anyhow!("Unrecognized password hash format")),
        }
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }
}

/// Identify the scheme of a stored hash from its prefix
pub fn detect_scheme(hash: &str) -> Option<PasswordScheme> {
    if hash.starts_with("$argon2") {
        Some(PasswordScheme::Argon2)
    } else if ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
    {
        Some(PasswordScheme::Bcrypt)
    } else {
        None
    }
}
