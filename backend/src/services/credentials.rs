//! Credential & token service
//!
//! Owns registration, credential checks and the bearer-token lifecycle.
//! Storage is injected through [`UserStore`]; the signing secret, algorithm
//! and default token lifetime come from configuration at construction.
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - JWT keys are derived once, in [`TokenService::new`]

use crate::auth::{PasswordService, TokenService};
use crate::config::AppConfig;
use crate::repositories::{NewUser, UserStore};
use crate::telemetry;
use bac_tutor_shared::{AuthError, Identity};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

// Hashed once per service; unknown usernames are checked against it.
const DUMMY_PASSWORD: &str = "bac-tutor-unknown-user";

/// Credential service
///
/// Cheap to clone; the store and keys are shared.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    passwords: PasswordService,
    tokens: TokenService,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, passwords: PasswordService, tokens: TokenService) -> Self {
        debug!(
            scheme = ?passwords.scheme(),
            default_ttl_secs = tokens.default_ttl().num_seconds(),
            "Credential service configured"
        );
        Self {
            store,
            passwords,
            tokens,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Build the service from application configuration
    pub fn from_config(store: Arc<dyn UserStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            PasswordService::new(&config.password),
            TokenService::new(&config.jwt),
        )
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user
    ///
    /// Does not issue a token. Callers validate that both fields are
    /// non-empty before calling.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let result = self.register_inner(username, password).await;
        telemetry::record_registration(&result);
        result
    }

    async fn register_inner(&self, username: &str, password: &str) -> Result<(), AuthError> {
        // Skip the expensive hash when the name is obviously taken.
        // The store repeats the check atomically on insert.
        if self.store.find_by_username(username).await?.is_some() {
            debug!(username, "Registration rejected: username taken");
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self
            .passwords
            .hash_async(password.to_string())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = self
            .store
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = record.id, username, "User registered");
        Ok(())
    }

    /// Check a username/password pair
    ///
    /// Unknown usernames and wrong passwords both fail with
    /// `InvalidCredentials`; the distinction only shows up in debug logs.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let result = self.authenticate_inner(username, password).await;
        telemetry::record_login(&result);
        result
    }

    async fn authenticate_inner(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            self.verify_against_dummy(password).await;
            debug!(username, reason = AuthError::UnknownIdentity.kind(), "Authentication failed");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash)
            .await
            .map_err(|e| {
                warn!(username, error = %e, "Stored password hash could not be checked");
                AuthError::Internal(e.to_string())
            })?;

        if !valid {
            debug!(username, reason = "password_mismatch", "Authentication failed");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity::new(user.username))
    }

    /// Spend the same hashing work as a real check, so unknown usernames
    /// take as long to reject as wrong passwords
    async fn verify_against_dummy(&self, password: &str) {
        let passwords = self.passwords;
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async move {
                passwords.hash_async(DUMMY_PASSWORD.to_string()).await
            })
            .await;

        match hash {
            Ok(hash) => {
                let _ = PasswordService::verify_async(password.to_string(), hash.clone()).await;
            }
            Err(e) => warn!(error = %e, "Dummy password hash could not be prepared"),
        }
    }

    /// Issue a signed token for `identity`
    ///
    /// `ttl` defaults to the configured default lifetime (15 minutes).
    pub fn issue_token(&self, identity: &Identity, ttl: Option<Duration>) -> Result<String, AuthError> {
        self.tokens.issue(identity, ttl)
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_token_at(
        &self,
        identity: &Identity,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        self.tokens.issue_at(identity, ttl, now)
    }

    /// Verify a bearer token and resolve its subject
    pub async fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_token_at(token, Utc::now()).await
    }

    /// Verify a bearer token against an explicit clock
    ///
    /// Checks run in order: structure, signature, expiry, then that the
    /// subject still exists in the store.
    pub async fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let result = self.verify_token_inner(token, now).await;
        if let Err(e) = &result {
            debug!(reason = e.kind(), "Token verification failed");
        }
        telemetry::record_verification(&result);
        result
    }

    async fn verify_token_inner(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let claims = self.tokens.decode_at(token, now)?;

        let user = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownIdentity)?;

        Ok(Identity::new(user.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryUserStore;
    use fake::faker::internet::en::{Password, Username};
    use fake::Fake;
    use proptest::prelude::*;

    // Lowest cost bcrypt accepts, keeps the tests fast
    const TEST_BCRYPT_COST: u32 = 4;

    fn test_service() -> CredentialService {
        CredentialService::new(
            Arc::new(InMemoryUserStore::new()),
            PasswordService::bcrypt(TEST_BCRYPT_COST),
            TokenService::from_secret("test-secret", Duration::minutes(15)),
        )
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();

        let identity = service.authenticate("amal", "secret123").await.unwrap();
        assert_eq!(identity, Identity::new("amal"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();

        let err = service.authenticate("amal", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid_credentials() {
        let service = test_service();

        let err = service.authenticate("ghost", "secret123").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_unknown_user_still_runs_password_check() {
        let service = test_service();
        assert!(service.dummy_hash.get().is_none());

        let err = service.authenticate("ghost", "secret123").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let dummy = service.dummy_hash.get().unwrap();
        assert!(PasswordService::verify(DUMMY_PASSWORD, dummy).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first_password() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();

        let err = service.register("amal", "other-password").await.unwrap_err();
        assert_eq!(err, AuthError::DuplicateIdentity);

        assert!(service.authenticate("amal", "secret123").await.is_ok());
        assert_eq!(
            service.authenticate("amal", "other-password").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plaintext() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();

        let record = service.store().find_by_username("amal").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "secret123");
        assert!(!record.password_hash.contains("secret123"));
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();
        let identity = service.authenticate("amal", "secret123").await.unwrap();

        let token = service.issue_token(&identity, Some(Duration::minutes(30))).unwrap();
        let verified = service.verify_token(&token).await.unwrap();

        assert_eq!(verified, identity);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let service = test_service();
        service.register("amal", "secret123").await.unwrap();

        let now = Utc::now();
        let token = service
            .issue_token_at(&Identity::new("amal"), Some(Duration::seconds(10)), now)
            .unwrap();

        assert!(service.verify_token_at(&token, now).await.is_ok());
        assert_eq!(
            service
                .verify_token_at(&token, now + Duration::seconds(10))
                .await
                .unwrap_err(),
            AuthError::Expired
        );
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_unknown_identity() {
        let service = test_service();
        let token = service.issue_token(&Identity::new("ghost"), None).unwrap();

        let err = service.verify_token(&token).await.unwrap_err();
        assert_eq!(err, AuthError::UnknownIdentity);
    }

    #[tokio::test]
    async fn test_token_survives_only_its_own_store() {
        // Same secret, fresh store: simulates a restart losing in-memory users
        let first = test_service();
        first.register("amal", "secret123").await.unwrap();
        let token = first.issue_token(&Identity::new("amal"), None).unwrap();

        let restarted = test_service();
        assert_eq!(
            restarted.verify_token(&token).await.unwrap_err(),
            AuthError::UnknownIdentity
        );
    }

    #[tokio::test]
    async fn test_flipped_signature_bit_is_invalid_signature() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let service = test_service();
        service.register("amal", "secret123").await.unwrap();
        let token = service.issue_token(&Identity::new("amal"), None).unwrap();

        let (message, signature) = token.rsplit_once('.').unwrap();
        for bit in [0usize, 7, 128, 255] {
            let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
            bytes[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{}.{}", message, URL_SAFE_NO_PAD.encode(&bytes));

            assert_eq!(
                service.verify_token(&tampered).await.unwrap_err(),
                AuthError::InvalidSignature
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let service = test_service();
        let err = service.verify_token("garbage").await.unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
    }

    #[tokio::test]
    async fn test_fake_users_register_and_authenticate() {
        let service = test_service();
        for i in 0..5 {
            let username: String = format!("{}{}", Username().fake::<String>(), i);
            let password: String = Password(8..24).fake();

            service.register(&username, &password).await.unwrap();
            let identity = service.authenticate(&username, &password).await.unwrap();
            assert_eq!(identity.username, username);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_any_wrong_password_is_rejected(
            password in "[ -~]{1,32}",
            wrong in "[ -~]{1,32}",
        ) {
            prop_assume!(password != wrong);

            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let service = test_service();
                service.register("amal", &password).await.unwrap();

                let err = service.authenticate("amal", &wrong).await.unwrap_err();
                prop_assert_eq!(err, AuthError::InvalidCredentials);

                let identity = service.authenticate("amal", &password).await.unwrap();
                prop_assert_eq!(identity.username, "amal");
                Ok(())
            })?;
        }
    }
}
