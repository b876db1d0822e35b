//! Tracked-user registry.

use std::sync::Arc;

use futures_util::future;
use retune_db::users::UserRecord;
use retune_db::{Platform, Stores};

use crate::CoreError;
use crate::emotes::EmoteService;
use crate::providers::{AvatarSource, ChannelDirectory, ChannelRef, ProviderError};

pub struct UserRegistry {
    stores: Stores,
    twitch: Arc<dyn ChannelDirectory>,
    youtube: Arc<dyn ChannelDirectory>,
    avatars: Arc<dyn AvatarSource>,
    emotes: Arc<EmoteService>,
}

impl UserRegistry {
    pub fn new(
        stores: Stores,
        twitch: Arc<dyn ChannelDirectory>,
        youtube: Arc<dyn ChannelDirectory>,
        avatars: Arc<dyn AvatarSource>,
        emotes: Arc<EmoteService>,
    ) -> Self {
        Self {
            stores,
            twitch,
            youtube,
            avatars,
            emotes,
        }
    }

    /// Track a user, or refresh an already-tracked one.
    ///
    /// Identity is resolved on the platform directory, the avatar is
    /// downloaded (best effort), and the row is upserted by id: a re-add
    /// refreshes avatar and display name, never id or username. A Twitch add
    /// also refreshes the user's emote set.
    pub async fn add(
        &self,
        platform: Platform,
        username: Option<&str>,
        id: Option<&str>,
    ) -> Result<UserRecord, CoreError> {
        let channel = match platform {
            Platform::Twitch => {
                let Some(username) = username.filter(|u| !u.is_empty()) else {
                    return Err(CoreError::InvalidInput("username not provided"));
                };
                self.twitch
                    .resolve(ChannelRef::Name(username))
                    .await
                    .map_err(lookup_err)?
            }
            Platform::YouTube => {
                let target = if let Some(id) = id.filter(|v| !v.is_empty()) {
                    ChannelRef::Id(id)
                } else if let Some(username) = username.filter(|u| !u.is_empty()) {
                    ChannelRef::Name(username)
                } else {
                    return Err(CoreError::InvalidInput("username or id not provided"));
                };
                self.youtube.resolve(target).await.map_err(lookup_err)?
            }
        };

        let avatar = self.avatars.fetch_avatar(&channel.avatar_url).await;

        let user = UserRecord {
            id: channel.id,
            username: channel.username,
            display_name: channel.display_name,
            avatar,
            platform,
        };
        self.stores.users.upsert(&user)?;

        if platform == Platform::Twitch {
            // Emote aggregation rides along on add. A degraded fetch is
            // logged and must not block tracking the user.
            if let Err(err) = self.emotes.refresh(&user.username, &user.id).await {
                tracing::warn!(username = %user.username, "Emote refresh on add failed: {err}");
            }
        }

        tracing::info!(platform = %platform, username = %user.username, "Tracked user");
        Ok(user)
    }

    /// Look up a tracked user by username or id.
    pub fn get(
        &self,
        platform: Platform,
        username: Option<&str>,
        id: Option<&str>,
    ) -> Result<Option<UserRecord>, CoreError> {
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            Ok(self.stores.users.by_username(platform, username)?)
        } else if let Some(id) = id.filter(|v| !v.is_empty()) {
            Ok(self.stores.users.by_id(platform, id)?)
        } else {
            Err(CoreError::InvalidInput("username or id not provided"))
        }
    }

    /// All tracked users, optionally filtered by platform.
    ///
    /// Without a filter, YouTube users come first, then Twitch; within a
    /// platform the order is whatever the store returns.
    pub fn list(&self, platform: Option<Platform>) -> Result<Vec<UserRecord>, CoreError> {
        match platform {
            Some(platform) => Ok(self.stores.users.list(platform)?),
            None => {
                let mut users = self.stores.users.list(Platform::YouTube)?;
                users.extend(self.stores.users.list(Platform::Twitch)?);
                Ok(users)
            }
        }
    }

    /// Import YouTube subscriptions from a Takeout CSV export.
    ///
    /// The shell owns the file dialog and hands over the file contents. The
    /// first line is a header; each remaining row's first field is a channel
    /// id. Already-tracked channels are skipped, and a channel that fails to
    /// resolve is logged and skipped rather than aborting the import.
    /// Returns the number of users imported.
    pub async fn import_subscriptions(&self, csv: &str) -> Result<u64, CoreError> {
        let mut channel_ids = Vec::new();
        for line in csv.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(id) = line.split(',').next().filter(|id| !id.is_empty()) else {
                continue;
            };
            channel_ids.push(id.to_string());
        }

        let tracked = self.stores.users.ids(Platform::YouTube)?;
        channel_ids.retain(|id| !tracked.contains(id));

        let fetches = channel_ids
            .iter()
            .map(|id| self.youtube.resolve(ChannelRef::Id(id)));
        let results = future::join_all(fetches).await;

        let mut imported = 0u64;
        for (channel_id, result) in channel_ids.iter().zip(results) {
            let channel = match result {
                Ok(channel) => channel,
                Err(err) => {
                    tracing::warn!(%channel_id, "Skipping channel: {err}");
                    continue;
                }
            };
            if channel.username.is_empty() {
                continue;
            }

            let avatar = self.avatars.fetch_avatar(&channel.avatar_url).await;
            self.stores.users.upsert(&UserRecord {
                id: channel.id,
                username: channel.username,
                display_name: channel.display_name,
                avatar,
                platform: Platform::YouTube,
            })?;
            imported += 1;
        }

        tracing::info!(imported, "Imported YouTube subscriptions");
        Ok(imported)
    }

    /// Stop tracking a user and drop every row referencing them.
    ///
    /// Dependent feed and emote rows go first, the user row last: if any
    /// step fails the user stays tracked and no orphan rows are left behind.
    pub fn remove(&self, platform: Platform, username: &str) -> Result<String, CoreError> {
        if username.is_empty() {
            return Err(CoreError::InvalidInput("username not provided"));
        }

        self.stores.feeds.delete_for_user(platform, username)?;
        if platform == Platform::Twitch {
            self.stores.emotes.delete_for_user(username)?;
        }
        self.stores.users.delete(platform, username)?;

        tracing::info!(platform = %platform, username, "Removed user");
        Ok(username.to_string())
    }
}

fn lookup_err(err: ProviderError) -> CoreError {
    match err {
        ProviderError::NotFound(who) => CoreError::UserNotFound(who),
        other => CoreError::Provider(other),
    }
}
