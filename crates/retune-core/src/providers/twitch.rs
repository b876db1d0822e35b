//! Twitch-backed provider adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use retune_db::emotes::EmoteRecord;
use retune_db::feeds::LiveStream;
use twitch_client::{TwitchClient, TwitchError};

use super::{
    ChannelDirectory, ChannelRef, EmoteSource, LiveSource, ProviderError, ResolvedChannel,
};

impl From<TwitchError> for ProviderError {
    fn from(err: TwitchError) -> Self {
        match err {
            TwitchError::UserNotFound(who) => ProviderError::NotFound(who),
            other => ProviderError::Unavailable(other.to_string()),
        }
    }
}

fn to_records(emotes: HashMap<String, twitch_client::emotes::Emote>) -> HashMap<String, EmoteRecord> {
    emotes
        .into_iter()
        .map(|(name, emote)| {
            (
                name,
                EmoteRecord {
                    name: emote.name,
                    url: emote.url,
                    width: emote.width,
                    height: emote.height,
                },
            )
        })
        .collect()
}

/// Live status via the batched UseLive operation.
pub struct TwitchLiveSource {
    client: TwitchClient,
}

impl TwitchLiveSource {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LiveSource for TwitchLiveSource {
    async fn live_now(&self, usernames: &[String]) -> Result<Vec<LiveStream>, ProviderError> {
        let live = self.client.live_now(usernames).await?;
        Ok(live
            .into_iter()
            .map(|stream| LiveStream {
                username: stream.username,
                started_at: stream.started_at,
            })
            .collect())
    }
}

/// Channel identity via the TurboAndSubUpsell operation.
pub struct TwitchDirectory {
    client: TwitchClient,
}

impl TwitchDirectory {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelDirectory for TwitchDirectory {
    async fn resolve(&self, target: ChannelRef<'_>) -> Result<ResolvedChannel, ProviderError> {
        let login = match target {
            ChannelRef::Name(name) => name,
            // Twitch users are tracked by login; id lookup has no caller.
            ChannelRef::Id(id) => {
                return Err(ProviderError::Unavailable(format!(
                    "Twitch lookup by id '{id}' is not supported"
                )));
            }
        };

        let channel = self.client.fetch_channel(login).await?;
        Ok(ResolvedChannel {
            id: channel.id,
            username: channel.login,
            display_name: channel.display_name,
            avatar_url: channel.avatar_url,
        })
    }
}

/// The channel's own subscription emotes, carried on the identity query.
pub struct SubscriptionEmoteSource {
    client: TwitchClient,
}

impl SubscriptionEmoteSource {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmoteSource for SubscriptionEmoteSource {
    fn tag(&self) -> &'static str {
        "subscriptions"
    }

    async fn fetch(
        &self,
        _user_id: &str,
        username: &str,
    ) -> Result<HashMap<String, EmoteRecord>, ProviderError> {
        let channel = self.client.fetch_channel(username).await?;
        Ok(to_records(channel.subscription_emotes))
    }
}

/// 7TV third-party emotes.
pub struct SevenTvSource {
    client: TwitchClient,
}

impl SevenTvSource {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmoteSource for SevenTvSource {
    fn tag(&self) -> &'static str {
        "7tv"
    }

    async fn fetch(
        &self,
        user_id: &str,
        _username: &str,
    ) -> Result<HashMap<String, EmoteRecord>, ProviderError> {
        Ok(to_records(self.client.seventv_emotes(user_id).await?))
    }
}

/// BetterTTV third-party emotes.
pub struct BetterTtvSource {
    client: TwitchClient,
}

impl BetterTtvSource {
    pub fn new(client: TwitchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmoteSource for BetterTtvSource {
    fn tag(&self) -> &'static str {
        "betterttv"
    }

    async fn fetch(
        &self,
        user_id: &str,
        _username: &str,
    ) -> Result<HashMap<String, EmoteRecord>, ProviderError> {
        Ok(to_records(self.client.betterttv_emotes(user_id).await?))
    }
}
