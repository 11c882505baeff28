//! API Router and Application State
//!
//! Central routing configuration and shared state.

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    auth,
    chat::{self, ChatProvider},
    config::Config,
    db, social,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Chat service client (optional)
    pub chat: Option<Arc<dyn ChatProvider>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config, chat: Option<Arc<dyn ChatProvider>>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            chat,
        }
    }

    /// Check if the chat service is configured.
    #[must_use]
    pub const fn has_chat(&self) -> bool {
        self.chat.is_some()
    }
}

/// OpenAPI document for the public REST surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "Tandem API"),
    paths(
        auth::handlers::signup,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::me,
        social::recommend::get_recommended_users,
        social::friends::list_friends,
        social::friends::send_friend_request,
        social::friends::accept_friend_request,
        social::friends::list_friend_requests,
        social::friends::list_outgoing_requests,
        social::onboarding::complete_onboarding,
        chat::handlers::get_token,
    ),
    components(schemas(
        db::PublicUser,
        db::UserSummary,
        social::types::FriendRequest,
        social::types::FriendRequestStatus,
        social::types::ReceivedRequest,
        social::types::SentRequest,
        social::types::FriendRequestsResponse,
        social::types::OutgoingRequestsResponse,
        social::types::OnboardingRequest,
        social::types::AcceptResponse,
    ))
)]
pub struct ApiDoc;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = match state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!(
                origin = %state.config.cors_origin,
                "Invalid CORS origin, cross-origin requests disabled"
            );
            CorsLayer::new()
        }
    };

    // Protected routes that require authentication
    let protected_routes = Router::new()
        .nest("/api/users", social::router())
        .nest("/api/chat", chat::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API documentation
        .route("/api/openapi.json", get(openapi_json))
        // Auth routes (pass state for middleware)
        .nest("/api/auth", auth::router(state.clone()))
        .merge(protected_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the chat service is configured
    chat: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        chat: state.has_chat(),
    })
}

/// Serve the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
