//! Bac Tutor Shared Library
//!
//! This crate contains the wire types, identity model and authentication
//! error taxonomy shared by the backend and its clients.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::Identity;
pub use types::*;
