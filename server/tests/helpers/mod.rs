//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router,
//! plus utilities for user creation, session tokens and a recording chat provider.
//!
//! Every test receives its own database from `#[sqlx::test]`, so no cleanup
//! between tests is needed.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response};
use axum::Router;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tandem_server::api::{create_router, AppState};
use tandem_server::auth::{hash_password, jwt};
use tandem_server::chat::{ChatError, ChatProvider, ChatUser};
use tandem_server::config::Config;
use tandem_server::db::{self, ProfileFields};
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Chat provider
// ============================================================================

/// Chat provider that records upserts and issues predictable tokens.
#[derive(Default)]
pub struct RecordingChat {
    pub upserts: Mutex<Vec<ChatUser>>,
}

impl RecordingChat {
    /// Users pushed to the chat service so far.
    pub fn upserted(&self) -> Vec<ChatUser> {
        self.upserts.lock().expect("poisoned").clone()
    }
}

impl ChatProvider for RecordingChat {
    fn create_token(&self, user_id: Uuid) -> Result<String, ChatError> {
        Ok(format!("chat-token-{user_id}"))
    }

    fn upsert_user<'a>(&'a self, user: &'a ChatUser) -> BoxFuture<'a, Result<(), ChatError>> {
        self.upserts.lock().expect("poisoned").push(user.clone());
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub chat: Arc<RecordingChat>,
}

impl TestApp {
    /// Create a test app on the given pool with a recording chat provider.
    pub fn new(pool: PgPool) -> Self {
        let chat = Arc::new(RecordingChat::default());
        let provider: Arc<dyn ChatProvider> = chat.clone();
        Self::build(pool, Some(provider), chat)
    }

    /// Create a test app with no chat service configured.
    pub fn without_chat(pool: PgPool) -> Self {
        Self::build(pool, None, Arc::new(RecordingChat::default()))
    }

    fn build(
        pool: PgPool,
        provider: Option<Arc<dyn ChatProvider>>,
        chat: Arc<RecordingChat>,
    ) -> Self {
        let config = Config::default_for_test();
        let state = AppState::new(pool.clone(), config.clone(), provider);

        Self {
            router: create_router(state),
            pool,
            config: Arc::new(config),
            chat,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Send an authenticated request without a body.
    pub async fn send_as(&self, method: Method, uri: &str, user_id: Uuid) -> Response<Body> {
        let token = session_token(&self.config, user_id);
        let req = Self::request(method, uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.oneshot(req).await
    }

    /// Send an authenticated request with a JSON body.
    pub async fn send_json_as(
        &self,
        method: Method,
        uri: &str,
        user_id: Uuid,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let token = session_token(&self.config, user_id);
        let req = Self::request(method, uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap();
        self.oneshot(req).await
    }

    /// Send an unauthenticated request with a JSON body.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let req = Self::request(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap();
        self.oneshot(req).await
    }
}

// ============================================================================
// User & Auth helpers
// ============================================================================

/// Issue a session token for `user_id`.
pub fn session_token(config: &Config, user_id: Uuid) -> String {
    jwt::issue_session_token(user_id, &config.jwt_secret, config.jwt_expiry)
        .expect("Failed to issue session token")
}

/// Create a user that has not completed onboarding.
pub async fn create_user(pool: &PgPool, name: &str, password: &str) -> Uuid {
    let hash = hash_password(password).expect("Failed to hash password");
    db::create_user(
        pool,
        &format!("{}@example.com", name.to_lowercase()),
        name,
        &hash,
        "https://avatar.iran.liara.run/public/1.png",
    )
    .await
    .expect("Failed to create test user")
    .id
}

/// Create a user and complete onboarding.
pub async fn create_onboarded_user(pool: &PgPool, name: &str) -> Uuid {
    let id = create_user(pool, name, "password").await;
    let profile = ProfileFields {
        full_name: name.to_string(),
        bio: format!("Hi, I'm {name}"),
        native_language: "english".to_string(),
        learning_language: "french".to_string(),
        location: "Montreal".to_string(),
        profile_pic: None,
    };
    db::complete_onboarding(pool, id, &profile)
        .await
        .expect("Failed to onboard test user")
        .expect("Test user vanished");
    id
}

// ============================================================================
// Response helpers
// ============================================================================

/// Parse a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// The `Set-Cookie` header for the session cookie, if any.
pub fn session_set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("jwt="))
        .map(ToString::to_string)
}

/// Collect the `id` fields of a JSON array.
pub fn ids(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|v| v["id"].as_str().expect("Expected string id").to_string())
        .collect()
}
