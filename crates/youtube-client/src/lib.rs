//! YouTube client.
//!
//! Talks to the Innertube JSON endpoints used by the web app (no API key, no
//! login). Responses are deeply nested renderer trees; the parsers here pull
//! out only the fields the application stores.

pub mod channel;
pub mod video;

use std::time::Duration;

use serde_json::{Value, json};

const INNERTUBE_API: &str = "https://www.youtube.com/youtubei/v1";
const CLIENT_VERSION: &str = "2.20240701.00.00";

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Unified error type for the youtube-client crate.
#[derive(Debug, thiserror::Error)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YouTube API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Channel '{0}' not found")]
    ChannelNotFound(String),

    #[error("All {0} channel fetches failed")]
    AllChannelsFailed(usize),
}

/// Shared HTTP client for Innertube calls.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
}

impl YouTubeClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    /// POST a body to an Innertube endpoint, injecting the client context.
    pub(crate) async fn post_json(
        &self,
        endpoint: &str,
        mut body: Value,
    ) -> Result<Value, YouTubeError> {
        if let Some(map) = body.as_object_mut() {
            map.insert("context".into(), client_context());
        }

        let url = format!("{INNERTUBE_API}/{endpoint}?prettyPrint=false");
        let resp = self.http.post(&url).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

fn client_context() -> Value {
    json!({
        "client": {
            "clientName": "WEB",
            "clientVersion": CLIENT_VERSION,
            "hl": "en",
            "gl": "US",
        }
    })
}
