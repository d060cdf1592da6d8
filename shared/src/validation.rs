//! Input validation functions
//!
//! Credentials carry no format rules beyond being present. Usernames are
//! case-sensitive and stored exactly as submitted.

use crate::types::RegisterRequest;
use validator::Validate;

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    Ok(())
}

/// Validate a registration request, returning the first failing message
pub fn validate_registration(req: &RegisterRequest) -> Result<(), String> {
    req.validate().map_err(|errors| {
        errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid registration request".to_string())
    })
}
