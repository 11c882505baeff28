use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::auth::ErrorResponse;
use crate::db::UserSummary;

/// Friend request status enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[sqlx(type_name = "friend_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
}

/// Friend request record from database
#[derive(Debug, Clone, FromRow, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Friend request joined with the display fields of one party
/// (the sender or the recipient, depending on the listing).
#[derive(Debug, Clone, FromRow)]
pub struct RequestWithParty {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub party_id: Uuid,
    pub party_full_name: String,
    pub party_profile_pic: String,
    pub party_native_language: String,
    pub party_learning_language: String,
}

impl RequestWithParty {
    fn party(&self) -> UserSummary {
        UserSummary {
            id: self.party_id,
            full_name: self.party_full_name.clone(),
            profile_pic: self.party_profile_pic.clone(),
            native_language: self.party_native_language.clone(),
            learning_language: self.party_learning_language.clone(),
        }
    }

    /// View with the sender expanded.
    pub fn into_received(self) -> ReceivedRequest {
        ReceivedRequest {
            sender: self.party(),
            id: self.id,
            recipient_id: self.recipient_id,
            status: self.status,
            created_at: self.created_at,
        }
    }

    /// View with the recipient expanded.
    pub fn into_sent(self) -> SentRequest {
        SentRequest {
            recipient: self.party(),
            id: self.id,
            sender_id: self.sender_id,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// A request someone sent to the current user.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRequest {
    pub id: Uuid,
    pub sender: UserSummary,
    pub recipient_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A request the current user sent.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient: UserSummary,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Response for GET /api/users/friend-requests
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestsResponse {
    /// Pending requests addressed to the user.
    pub incoming_reqs: Vec<ReceivedRequest>,
    /// Requests the user sent that have been accepted.
    pub accepted_reqs: Vec<SentRequest>,
}

/// Response for GET /api/users/outgoing-friend-requests
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRequestsResponse {
    pub outgoing_requests: Vec<SentRequest>,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AcceptResponse {
    pub message: String,
}

/// Request body for onboarding.
#[derive(Debug, Default, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingRequest {
    #[validate(length(max = 64))]
    pub full_name: String,
    #[validate(length(max = 500))]
    pub bio: String,
    #[validate(length(max = 64))]
    pub native_language: String,
    #[validate(length(max = 64))]
    pub learning_language: String,
    #[validate(length(max = 128))]
    pub location: String,
    #[validate(url)]
    pub profile_pic: Option<String>,
}

impl OnboardingRequest {
    /// Names (as sent on the wire) of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("bio", &self.bio),
            ("nativeLanguage", &self.native_language),
            ("learningLanguage", &self.learning_language),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Error types for social operations
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("You cannot send friend request to yourself")]
    SelfFriendRequest,

    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("You are already friends with this user")]
    AlreadyFriends,

    #[error("A friend request already exists between you and this user")]
    DuplicateRequest,

    #[error("Friend request not found")]
    RequestNotFound,

    #[error("You are not authorized to accept this request")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SocialError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (axum::http::StatusCode, &'static str) {
        use axum::http::StatusCode;

        match self {
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            Self::SelfFriendRequest => (StatusCode::BAD_REQUEST, "SELF_FRIEND_REQUEST"),
            Self::RecipientNotFound => (StatusCode::BAD_REQUEST, "RECIPIENT_NOT_FOUND"),
            Self::AlreadyFriends => (StatusCode::BAD_REQUEST, "ALREADY_FRIENDS"),
            Self::DuplicateRequest => (StatusCode::BAD_REQUEST, "REQUEST_EXISTS"),
            Self::RequestNotFound => (StatusCode::NOT_FOUND, "REQUEST_NOT_FOUND"),
            Self::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }
}

impl axum::response::IntoResponse for SocialError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let (status, code) = self.status_and_code();
        let message = match &self {
            Self::Database(err) => {
                tracing::error!("Database error: {}", err);
                "Internal Server Error".to_string()
            }
            Self::Validation(msg) => msg.clone(),
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SocialError::SelfFriendRequest.status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SocialError::RecipientNotFound.status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SocialError::AlreadyFriends.status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SocialError::DuplicateRequest.status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SocialError::RequestNotFound.status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SocialError::Unauthorized.status_and_code().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SocialError::Database(sqlx::Error::PoolTimedOut)
                .status_and_code()
                .0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_database_error_body_is_generic() {
        let response = SocialError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "Internal Server Error");
    }

    #[test]
    fn test_missing_onboarding_fields() {
        let body = OnboardingRequest {
            full_name: "Ana".into(),
            bio: "  ".into(),
            native_language: "portuguese".into(),
            ..Default::default()
        };

        assert_eq!(
            body.missing_fields(),
            vec!["bio", "learningLanguage", "location"]
        );
    }

    #[test]
    fn test_onboarding_rejects_bad_avatar_url() {
        let body = OnboardingRequest {
            full_name: "Ana".into(),
            bio: "hi".into(),
            native_language: "portuguese".into(),
            learning_language: "german".into(),
            location: "Porto".into(),
            profile_pic: Some("not a url".into()),
        };

        assert!(body.missing_fields().is_empty());
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(FriendRequestStatus::Pending).unwrap(),
            "pending"
        );
        assert_eq!(
            serde_json::to_value(FriendRequestStatus::Accepted).unwrap(),
            "accepted"
        );
    }
}
