use axum::{extract::State, Json};
use validator::Validate;

use super::types::{OnboardingRequest, SocialError};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::chat::sync_chat_user;
use crate::db::{self, ProfileFields, PublicUser};

/// PUT /api/users/onboarding
/// Save profile fields and mark the user as onboarded
#[utoipa::path(
    put,
    path = "/api/users/onboarding",
    tag = "users",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Updated user", body = PublicUser),
        (status = 400, description = "Missing or invalid fields")
    )
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.id))]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut body): Json<OnboardingRequest>,
) -> Result<Json<PublicUser>, SocialError> {
    // A blank avatar means "keep the current one"
    if body
        .profile_pic
        .as_deref()
        .is_some_and(|pic| pic.trim().is_empty())
    {
        body.profile_pic = None;
    }

    let missing = body.missing_fields();
    if !missing.is_empty() {
        return Err(SocialError::Validation(format!(
            "All fields are required. Missing: {}",
            missing.join(", ")
        )));
    }

    body.validate()
        .map_err(|e| SocialError::Validation(e.to_string()))?;

    let profile = ProfileFields {
        full_name: body.full_name.trim().to_string(),
        bio: body.bio.trim().to_string(),
        native_language: body.native_language.trim().to_string(),
        learning_language: body.learning_language.trim().to_string(),
        location: body.location.trim().to_string(),
        profile_pic: body.profile_pic.map(|pic| pic.trim().to_string()),
    };

    let user = db::complete_onboarding(&state.db, auth.id, &profile)
        .await?
        .ok_or(SocialError::UserNotFound)?;

    sync_chat_user(&state, &user).await;

    tracing::info!(user_id = %user.id, "User onboarded");

    Ok(Json(user.into()))
}
