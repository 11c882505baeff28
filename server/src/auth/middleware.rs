//! Authentication Middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::api::AppState;
use crate::db::{list_friend_ids, user_exists};

use super::error::AuthError;
use super::jwt::validate_session_token;
use super::SESSION_COOKIE;

/// Authenticated user injected into request extensions.
///
/// Carries the caller's friend set as loaded at authentication time, which the
/// recommendation filter consumes directly.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// IDs of the user's friends.
    pub friends: Vec<Uuid>,
}

/// Pull the session token from `Authorization: Bearer` or, failing that, the session cookie.
fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(header) = headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;
        return Ok(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Middleware to require authentication.
///
/// Validates the session token, checks the user still exists, loads its
/// friend set, and injects `AuthUser` into request extensions.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(request.headers())?;

    let claims = validate_session_token(&token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    if !user_exists(&state.db, user_id).await? {
        return Err(AuthError::UserNotFound);
    }
    let friends = list_friend_ids(&state.db, user_id).await?;

    request.extensions_mut().insert(AuthUser {
        id: user_id,
        friends,
    });

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user in handlers behind [`require_auth`].
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
