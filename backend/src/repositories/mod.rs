//! User repositories
//!
//! Provides the storage seam used by the credential service.

pub mod user;

pub use user::{InMemoryUserStore, NewUser, PgUserStore, UserRecord, UserStore};
