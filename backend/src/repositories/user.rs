//! User repositories
//!
//! The credential service only needs two capabilities from storage:
//! look a user up by username and insert a new one. [`UserStore`] captures
//! exactly that so the in-memory map can be swapped for Postgres without
//! touching the service.

use async_trait::async_trait;
use bac_tutor_shared::AuthError;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// Data-access layer for user records
///
/// `insert` must check uniqueness and assign the id in one atomic step.
/// Concurrent inserts of the same username leave exactly one record.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by exact (case-sensitive) username
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Store a new user, failing with `DuplicateIdentity` if the username exists
    async fn insert(&self, user: NewUser) -> Result<UserRecord, AuthError>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<String, UserRecord>,
    last_id: i64,
}

/// Process-lifetime user store backed by a `HashMap`
///
/// Records are lost on restart.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<MemoryInner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, AuthError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.username) {
            return Err(AuthError::DuplicateIdentity);
        }

        inner.last_id += 1;
        let record = UserRecord {
            id: inner.last_id,
            username: user.username,
            password_hash: user.password_hash,
        };
        inner.users.insert(record.username.clone(), record.clone());

        Ok(record)
    }
}

/// Postgres-backed user store
///
/// Uniqueness is enforced by the `users.username` constraint.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, AuthError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AuthError::DuplicateIdentity;
                }
            }
            storage_error(e)
        })
    }

    async fn ping(&self) -> Result<(), AuthError> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

fn storage_error(err: sqlx::Error) -> AuthError {
    AuthError::Internal(format!("User store error: {}", err))
}
