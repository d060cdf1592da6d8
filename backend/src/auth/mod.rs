//! Authentication module
//!
//! Provides JWT session tokens, argon2/bcrypt password hashing and the
//! bearer-token extractor for protected routes.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtKeys, TokenService};
pub use middleware::{auth_middleware, bearer_token, AuthUser};
pub use password::{detect_scheme, PasswordService};
