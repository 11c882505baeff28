pub mod friends;
pub mod onboarding;
pub mod recommend;
pub mod types;


use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::AppState;

/// Create the users router with discovery, onboarding and friend-request endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        // Discovery
        .route("/", get(recommend::get_recommended_users))
        .route("/friends", get(friends::list_friends))
        // Friend requests
        .route("/friend-request/{id}", post(friends::send_friend_request))
        .route(
            "/friend-request/{id}/accept",
            put(friends::accept_friend_request),
        )
        .route("/friend-requests", get(friends::list_friend_requests))
        .route(
            "/outgoing-friend-requests",
            get(friends::list_outgoing_requests),
        )
        // Profile
        .route("/onboarding", put(onboarding::complete_onboarding))
}
