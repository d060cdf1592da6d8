//! JWT token issuance and verification
//!
//! Tokens are stateless: validity is decided by the HMAC signature and the
//! `exp` claim alone. Keys are derived once from the configured secret.
//!
//! Expiry is checked here rather than by `jsonwebtoken` so that the check
//! is exact (no leeway) and can run against an explicit clock.

use bac_tutor_shared::{AuthError, Identity};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::JwtConfig;

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Pre-computed JWT keys for efficient token operations
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Token service for issuing and checking session tokens
///
/// Cheap to clone; keys are shared behind `Arc`.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl TokenService {
    /// Create a token service from the JWT configuration
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            keys: JwtKeys::new(config.secret.expose_secret().as_bytes()),
            algorithm: config.algorithm.into(),
            default_ttl: config.default_ttl(),
        }
    }

    /// Create an HS256 service directly from a secret
    pub fn from_secret(secret: &str, default_ttl: Duration) -> Self {
        Self {
            keys: JwtKeys::new(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issue a token for `identity`, valid for `ttl` (or the default ttl)
    #[inline]
    pub fn issue(&self, identity: &Identity, ttl: Option<Duration>) -> Result<String, AuthError> {
        self.issue_at(identity, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    ///
    /// Output is fully determined by the identity, ttl, `now` and secret.
    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(ttl.unwrap_or(self.default_ttl))
            .ok_or_else(|| AuthError::Internal("Token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: identity.username.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, self.keys.encoding())
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode a token and check its signature and expiry
    #[inline]
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, Utc::now())
    }

    /// Decode a token and check its signature and expiry against `now`
    ///
    /// A token is expired once `now >= exp`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, self.keys.decoding(), &validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Get the pre-computed keys (for sharing)
    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::MalformedToken,
    }
}
