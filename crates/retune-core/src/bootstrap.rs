//! Application assembly.
//!
//! Open the stores (which migrates each domain), build the default provider
//! adapters and hand back the wired [`App`]. A migration failure aborts the
//! whole init; running against a half-migrated store is never an option.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use twitch_client::TwitchClient;
use youtube_client::YouTubeClient;

use crate::emotes::EmoteService;
use crate::feed::FeedService;
use crate::providers::{
    BetterTtvSource, HttpAvatarSource, SevenTvSource, SubscriptionEmoteSource, TwitchDirectory,
    TwitchLiveSource, YouTubeDirectory, YouTubeVideoSource,
};
use crate::registry::UserRegistry;
use crate::{App, Stores};

/// Install the tracing subscriber. Call once, before [`init`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Per-user data directory holding the three domain databases.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retune")
}

/// Open the stores under the default data directory and assemble the app.
pub fn init() -> Result<App, anyhow::Error> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    tracing::info!("Opening stores under {}", dir.display());
    let stores = Stores::open(&dir)?;

    Ok(assemble(stores))
}

/// Wire the default (network-backed) providers onto the given stores.
pub fn assemble(stores: Stores) -> App {
    let twitch = TwitchClient::new();
    let youtube = YouTubeClient::new();

    let emotes = Arc::new(EmoteService::new(
        stores.clone(),
        vec![
            Arc::new(SubscriptionEmoteSource::new(twitch.clone())),
            Arc::new(SevenTvSource::new(twitch.clone())),
            Arc::new(BetterTtvSource::new(twitch.clone())),
        ],
    ));

    let feeds = FeedService::new(
        stores.clone(),
        Arc::new(TwitchLiveSource::new(twitch.clone())),
        Arc::new(YouTubeVideoSource::new(youtube.clone())),
    );

    let registry = UserRegistry::new(
        stores,
        Arc::new(TwitchDirectory::new(twitch)),
        Arc::new(YouTubeDirectory::new(youtube)),
        Arc::new(HttpAvatarSource::new()),
        emotes.clone(),
    );

    App {
        registry,
        feeds,
        emotes,
    }
}
