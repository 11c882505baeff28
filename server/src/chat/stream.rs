//! Stream Chat Client
//!
//! User tokens are HS256 JWTs with a `user_id` claim signed with the API
//! secret. Server-side REST calls authenticate with a `{"server": true}` token.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChatError, ChatProvider, ChatUser};
use crate::config::Config;

/// Claims of a client-side user token.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserTokenClaims {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
struct ServerTokenClaims {
    server: bool,
}

#[derive(Debug, Serialize)]
struct UpsertUsersBody<'a> {
    users: HashMap<&'a str, &'a ChatUser>,
}

/// Stream chat API client.
#[derive(Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    api_key: String,
    encoding_key: EncodingKey,
    base_url: String,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    /// Create a client from explicit credentials.
    pub fn new(api_key: &str, api_secret: &str, base_url: &str) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            encoding_key: EncodingKey::from_secret(api_secret.as_bytes()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        match (&config.stream_api_key, &config.stream_api_secret) {
            (Some(key), Some(secret)) => Self::new(key, secret, &config.stream_base_url),
            _ => Err(ChatError::NotConfigured),
        }
    }

    fn server_token(&self) -> Result<String, ChatError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &ServerTokenClaims { server: true },
            &self.encoding_key,
        )?)
    }

    async fn post_users(&self, user: &ChatUser) -> Result<(), ChatError> {
        let body = UpsertUsersBody {
            users: HashMap::from([(user.id.as_str(), user)]),
        };

        self.http
            .post(format!("{}/users", self.base_url))
            .query(&[("api_key", self.api_key.as_str())])
            .header("Authorization", self.server_token()?)
            .header("stream-auth-type", "jwt")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(user_id = %user.id, "Upserted chat user");
        Ok(())
    }
}

impl ChatProvider for StreamClient {
    fn create_token(&self, user_id: Uuid) -> Result<String, ChatError> {
        let claims = UserTokenClaims {
            user_id: user_id.to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    fn upsert_user<'a>(&'a self, user: &'a ChatUser) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(self.post_users(user))
    }
}
