//! Avatar download.

use std::time::Duration;

use async_trait::async_trait;

use super::AvatarSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Plain HTTP avatar fetch. Any failure degrades to an empty byte buffer;
/// a missing avatar never blocks tracking a user.
pub struct HttpAvatarSource {
    http: reqwest::Client,
}

impl HttpAvatarSource {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

impl Default for HttpAvatarSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AvatarSource for HttpAvatarSource {
    async fn fetch_avatar(&self, url: &str) -> Vec<u8> {
        if url.is_empty() {
            tracing::warn!("Avatar url is empty");
            return Vec::new();
        }

        match self.download(url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(url, "Failed to download avatar: {err}");
                Vec::new()
            }
        }
    }
}
