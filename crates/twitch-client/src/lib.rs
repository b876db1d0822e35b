//! Anonymous Twitch client.
//!
//! Talks to the public GraphQL endpoint used by the web player (persisted
//! queries, no account token) for live status and channel identity, and to
//! the 7TV and BetterTTV services for third-party emotes. The caller is
//! responsible for persisting results (e.g. via retune-db).

pub mod emotes;
pub mod gql;
pub mod stream;
pub mod user;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Unified error type for the twitch-client crate.
#[derive(Debug, thiserror::Error)]
pub enum TwitchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Twitch API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("User '{0}' not found")]
    UserNotFound(String),
}

/// Shared HTTP client for GraphQL and emote-provider calls.
#[derive(Clone)]
pub struct TwitchClient {
    http: reqwest::Client,
}

impl TwitchClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    /// POST one or more persisted operations to the GraphQL endpoint.
    pub(crate) async fn send_query<T: DeserializeOwned>(
        &self,
        body: &impl Serialize,
    ) -> Result<T, TwitchError> {
        let resp = self
            .http
            .post(gql::GQL_ENDPOINT)
            .header("Client-ID", gql::CLIENT_ID)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(TwitchError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// GET a JSON document from an emote provider.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TwitchError> {
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(TwitchError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for TwitchClient {
    fn default() -> Self {
        Self::new()
    }
}
