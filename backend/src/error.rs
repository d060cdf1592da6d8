//! Application error handling
//!
//! This module converts internal errors to HTTP responses. Authentication
//! errors keep their precise kind up to this point; here they collapse to
//! 400 (duplicate registration) or 401 with a generic message.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bac_tutor_shared::{AuthError, ErrorResponse};
use thiserror::Error;
use tracing::{debug, error};

/// Detail returned when a login attempt fails
pub const LOGIN_FAILED_DETAIL: &str = "Incorrect username or password";

/// Detail returned when a bearer token is rejected
pub const TOKEN_REJECTED_DETAIL: &str = "Could not validate credentials";

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Auth(err) => match err {
                AuthError::DuplicateIdentity => {
                    (StatusCode::BAD_REQUEST, "DUPLICATE_IDENTITY", err.to_string())
                }
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    LOGIN_FAILED_DETAIL.to_string(),
                ),
                AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::UnknownIdentity => {
                    debug!(reason = err.kind(), "Rejecting bearer token");
                    (
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        TOKEN_REJECTED_DETAIL.to_string(),
                    )
                }
                AuthError::Internal(msg) => {
                    error!("Authentication internal error: {}", msg);
                    internal()
                }
            },
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                internal()
            }
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = self.parts();

        let body = Json(ErrorResponse {
            detail,
            code: code.to_string(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
