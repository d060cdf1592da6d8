//! Bac Tutor Backend Library
//!
//! Credential & token service for the tutor API: registration, password
//! login and bearer-token verification. Exposed as a library for tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
