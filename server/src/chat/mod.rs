//! Chat Service
//!
//! Issues tokens for the third-party chat service and keeps its user
//! directory in step with local profiles.

pub(crate) mod handlers;
pub mod stream;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::future::BoxFuture;
use serde::Serialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::ErrorResponse;
use crate::db::User;

pub use handlers::ChatTokenResponse;
pub use stream::StreamClient;

/// Create the chat router.
pub fn router() -> Router<AppState> {
    Router::new().route("/token", get(handlers::get_token))
}

/// A user as known to the chat service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
    pub image: String,
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.full_name.clone(),
            image: user.profile_pic.clone(),
        }
    }
}

/// Chat service capability: token issuing plus user provisioning.
///
/// Built once at start-up and shared through [`AppState`], so tests can swap
/// in their own implementation.
pub trait ChatProvider: Send + Sync {
    /// Issue a client token for `user_id`.
    fn create_token(&self, user_id: Uuid) -> Result<String, ChatError>;

    /// Create or update `user` in the chat service's directory.
    fn upsert_user<'a>(&'a self, user: &'a ChatUser) -> BoxFuture<'a, Result<(), ChatError>>;
}

/// Error types for chat operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat service is not configured")]
    NotConfigured,

    #[error("Failed to sign chat token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Chat service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CHAT_UNAVAILABLE",
                self.to_string(),
            ),
            Self::Token(_) | Self::Http(_) => {
                tracing::error!(error = %self, "Chat service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Push a user's current profile to the chat service.
///
/// Best effort: failures are logged and never fail the calling request.
pub async fn sync_chat_user(state: &AppState, user: &User) {
    let Some(chat) = state.chat.as_ref() else {
        return;
    };

    if let Err(e) = chat.upsert_user(&ChatUser::from(user)).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to upsert chat user");
    }
}
