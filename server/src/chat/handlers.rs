//! Chat HTTP Handlers

use axum::{extract::State, Json};
use serde::Serialize;

use super::ChatError;
use crate::api::AppState;
use crate::auth::AuthUser;

/// Chat token response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatTokenResponse {
    /// Client token for the chat service.
    pub token: String,
}

/// GET /api/chat/token
/// Issue a chat service token for the current user
#[utoipa::path(
    get,
    path = "/api/chat/token",
    tag = "chat",
    responses(
        (status = 200, description = "Chat token", body = ChatTokenResponse),
        (status = 503, description = "Chat service not configured")
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ChatTokenResponse>, ChatError> {
    let chat = state.chat.as_ref().ok_or(ChatError::NotConfigured)?;
    let token = chat.create_token(auth.id)?;

    Ok(Json(ChatTokenResponse { token }))
}
