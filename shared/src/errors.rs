//! Error types for the Bac Tutor application

use thiserror::Error;

/// Authentication error types
///
/// Every kind stays distinct here. Deciding how much of it reaches the
/// client is left to the HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Registration attempted for a username that is already taken
    #[error("Username already registered")]
    DuplicateIdentity,

    /// Unknown username or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token could not be split, decoded or parsed
    #[error("Malformed token")]
    MalformedToken,

    /// Token signature does not verify against the service secret
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token expiry claim is not in the future
    #[error("Token expired")]
    Expired,

    /// Token subject does not resolve to a stored user
    #[error("Unknown identity")]
    UnknownIdentity,

    /// Hashing or storage fault unrelated to the caller's input
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable snake_case label, used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::UnknownIdentity => "unknown_identity",
            AuthError::Internal(_) => "internal",
        }
    }

    /// Whether the error came from token verification
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::UnknownIdentity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AuthError::DuplicateIdentity, "duplicate_identity", false)]
    #[case(AuthError::InvalidCredentials, "invalid_credentials", false)]
    #[case(AuthError::MalformedToken, "malformed_token", true)]
    #[case(AuthError::InvalidSignature, "invalid_signature", true)]
    #[case(AuthError::Expired, "expired", true)]
    #[case(AuthError::UnknownIdentity, "unknown_identity", true)]
    #[case(AuthError::Internal("boom".to_string()), "internal", false)]
    fn test_error_kind_labels(
        #[case] error: AuthError,
        #[case] kind: &str,
        #[case] token_error: bool,
    ) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.is_token_error(), token_error);
    }

    #[test]
    fn test_duplicate_message_matches_api_detail() {
        assert_eq!(
            AuthError::DuplicateIdentity.to_string(),
            "Username already registered"
        );
    }
}
