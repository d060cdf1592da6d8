//! Authentication routes
//!
//! - `POST /users`: register (query, JSON or form parameters)
//! - `POST /token`: OAuth2 password-form login, returns a bearer token
//! - `GET /users/me`: the identity behind the presented token
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use bac_tutor_shared::{
    validation::validate_registration, AccessToken, LoginForm, MessageResponse, RegisterRequest,
    UserProfile,
};

/// Registration parameters from the query string or the request body
///
/// The query string wins when it carries both fields; otherwise the body
/// is read as JSON or as a form depending on `Content-Type`.
#[derive(Debug)]
pub struct RegistrationParams(pub RegisterRequest);

#[async_trait]
impl<S> FromRequest<S> for RegistrationParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(Query(params)) = Query::<RegisterRequest>::try_from_uri(req.uri()) {
            return Ok(Self(params));
        }

        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        let params = if is_json {
            Json::<RegisterRequest>::from_request(req, state)
                .await
                .map(|Json(p)| p)
                .map_err(|e| ApiError::Validation(e.body_text()))?
        } else {
            Form::<RegisterRequest>::from_request(req, state)
                .await
                .map(|Form(p)| p)
                .map_err(|_| {
                    ApiError::Validation("username and password are required".to_string())
                })?
        };

        Ok(Self(params))
    }
}

/// Register a new user
///
/// POST /users
pub async fn register(
    State(state): State<AppState>,
    RegistrationParams(req): RegistrationParams,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    validate_registration(&req).map_err(ApiError::Validation)?;

    state
        .credentials()
        .register(&req.username, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// Exchange a username and password for a bearer token
///
/// POST /token (application/x-www-form-urlencoded)
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<AccessToken>> {
    let credentials = state.credentials();
    let identity = credentials
        .authenticate(&form.username, &form.password)
        .await?;

    let ttl = state.config().jwt.access_ttl();
    let access_token = credentials.issue_token(&identity, Some(ttl))?;

    Ok(Json(AccessToken::bearer(access_token)))
}

/// Get the current user (requires authentication)
///
/// GET /users/me
pub async fn current_user(auth_user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        username: auth_user.identity.username,
    })
}
