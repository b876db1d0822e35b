//! Provider seams.
//!
//! Every external data source is consumed through one of these traits, so
//! the services stay testable and never depend on a concrete wire format.
//! Implementations must not hold any store lock while a request is in
//! flight; the services fetch first and only then open a write transaction.

pub mod avatar;
pub mod twitch;
pub mod youtube;

use std::collections::HashMap;

use async_trait::async_trait;
use retune_db::emotes::EmoteRecord;
use retune_db::feeds::{FeedVideo, LiveStream};

pub use avatar::HttpAvatarSource;
pub use twitch::{BetterTtvSource, SevenTvSource, SubscriptionEmoteSource, TwitchDirectory, TwitchLiveSource};
pub use youtube::{YouTubeDirectory, YouTubeVideoSource};

/// Failure surfaced by a provider adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("Provider request failed: {0}")]
    Unavailable(String),
}

/// How a channel is addressed on its platform.
#[derive(Debug, Clone, Copy)]
pub enum ChannelRef<'a> {
    Name(&'a str),
    Id(&'a str),
}

/// Identity as resolved by a platform directory.
#[derive(Debug, Clone)]
pub struct ResolvedChannel {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// Batched live-status lookup (one logical request per refresh).
#[async_trait]
pub trait LiveSource: Send + Sync {
    async fn live_now(&self, usernames: &[String]) -> Result<Vec<LiveStream>, ProviderError>;
}

/// Batched upload-feed lookup (one logical request per refresh).
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn latest_videos(&self, channel_ids: &[String]) -> Result<Vec<FeedVideo>, ProviderError>;
}

/// One emote origin (subscription products, 7TV, BetterTTV, ...).
#[async_trait]
pub trait EmoteSource: Send + Sync {
    fn tag(&self) -> &'static str;

    async fn fetch(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<HashMap<String, EmoteRecord>, ProviderError>;
}

/// Identity lookup on a platform directory.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn resolve(&self, target: ChannelRef<'_>) -> Result<ResolvedChannel, ProviderError>;
}

/// Avatar image download. Failure yields empty bytes, never an error.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    async fn fetch_avatar(&self, url: &str) -> Vec<u8>;
}
