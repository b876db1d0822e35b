//! YouTube-backed provider adapters.

use async_trait::async_trait;
use retune_db::feeds::FeedVideo;
use youtube_client::{YouTubeClient, YouTubeError};

use super::{ChannelDirectory, ChannelRef, ProviderError, ResolvedChannel, VideoSource};

impl From<YouTubeError> for ProviderError {
    fn from(err: YouTubeError) -> Self {
        match err {
            YouTubeError::ChannelNotFound(who) => ProviderError::NotFound(who),
            other => ProviderError::Unavailable(other.to_string()),
        }
    }
}

/// Upload feeds via the Innertube browse endpoint.
pub struct YouTubeVideoSource {
    client: YouTubeClient,
}

impl YouTubeVideoSource {
    pub fn new(client: YouTubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoSource for YouTubeVideoSource {
    async fn latest_videos(&self, channel_ids: &[String]) -> Result<Vec<FeedVideo>, ProviderError> {
        let videos = self.client.latest_videos(channel_ids).await?;
        Ok(videos
            .into_iter()
            .map(|video| FeedVideo {
                id: video.id,
                username: video.username,
                title: video.title,
                published_at: video.published_at,
                view_count: video.view_count,
            })
            .collect())
    }
}

/// Channel identity via Innertube search and browse.
pub struct YouTubeDirectory {
    client: YouTubeClient,
}

impl YouTubeDirectory {
    pub fn new(client: YouTubeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelDirectory for YouTubeDirectory {
    async fn resolve(&self, target: ChannelRef<'_>) -> Result<ResolvedChannel, ProviderError> {
        let channel = match target {
            ChannelRef::Id(id) => self.client.channel_by_id(id).await?,
            ChannelRef::Name(name) => self.client.channel_by_name(name).await?,
        };

        Ok(ResolvedChannel {
            id: channel.id,
            username: channel.username,
            display_name: channel.display_name,
            avatar_url: channel.avatar_url,
        })
    }
}
