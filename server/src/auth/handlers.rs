//! Authentication HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::{AuthError, AuthResult};
use super::jwt::issue_session_token;
use super::middleware::AuthUser;
use super::password::{hash_password, verify_password};
use super::SESSION_COOKIE;
use crate::api::AppState;
use crate::chat::sync_chat_user;
use crate::config::Config;
use crate::db::{self, create_user, email_exists, find_user_by_email, PublicUser};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Signup request.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Email address.
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    /// Password (at least 6 characters).
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 64, message = "Full name is required"))]
    pub full_name: String,
}

/// Login request.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Authentication response with the session token.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: PublicUser,
    /// Session token (also set as the `jwt` cookie).
    pub token: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Number of stock avatars served by the avatar service.
const AVATAR_COUNT: u32 = 100;

/// Pick a random stock avatar for a new account.
fn random_avatar() -> String {
    let idx = rand::thread_rng().gen_range(1..=AVATAR_COUNT);
    format!("https://avatar.iran.liara.run/public/{idx}.png")
}

/// Build the HTTP-only session cookie carrying `token`.
fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(config.jwt_expiry))
        .build()
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user.
///
/// POST /api/auth/signup
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
#[tracing::instrument(skip(state, jar, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> AuthResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let full_name = body.full_name.trim();
    if full_name.is_empty() {
        return Err(AuthError::Validation("Full name is required".to_string()));
    }

    // UNIQUE constraint still catches a concurrent signup with the same email
    if email_exists(&state.db, &body.email).await? {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = hash_password(&body.password).map_err(|_| AuthError::PasswordHash)?;

    let user = create_user(
        &state.db,
        body.email.trim(),
        full_name,
        &password_hash,
        &random_avatar(),
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AuthError::UserAlreadyExists
        }
        _ => AuthError::Database(e),
    })?;

    sync_chat_user(&state, &user).await;

    let token = issue_session_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry)?;
    let jar = jar.add(session_cookie(token.clone(), &state.config));

    tracing::info!(user_id = %user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
#[tracing::instrument(skip(state, jar, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AuthResult<(CookieJar, Json<AuthResponse>)> {
    let user = find_user_by_email(&state.db, body.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid =
        verify_password(&body.password, &user.password_hash).map_err(|_| AuthError::PasswordHash)?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let token = issue_session_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry)?;
    let jar = jar.add(session_cookie(token.clone(), &state.config));

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Clear the session cookie.
///
/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    (
        jar,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// Get the current user's profile.
///
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AuthResult<Json<PublicUser>> {
    let user = db::find_user_by_id(&state.db, auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.into()))
}
