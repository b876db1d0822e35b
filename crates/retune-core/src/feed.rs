//! Feed synchronization.
//!
//! `feed` reads the cached snapshot and never touches the network.
//! `refresh` fetches from the platform in one batched request, then swaps the
//! cached snapshot in a single transaction: on any provider failure the cache
//! is left exactly as it was.

use std::sync::Arc;

use retune_db::feeds::{FeedVideo, LiveStream, VIDEO_PAGE_SIZE};
use retune_db::{Platform, Stores};
use serde::Serialize;

use crate::CoreError;
use crate::providers::{LiveSource, VideoSource};

/// Cached feed state for one platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "platform", content = "items")]
pub enum Feed {
    Twitch(Vec<LiveStream>),
    YouTube(Vec<FeedVideo>),
}

pub struct FeedService {
    stores: Stores,
    live_source: Arc<dyn LiveSource>,
    video_source: Arc<dyn VideoSource>,
}

impl FeedService {
    pub fn new(
        stores: Stores,
        live_source: Arc<dyn LiveSource>,
        video_source: Arc<dyn VideoSource>,
    ) -> Self {
        Self {
            stores,
            live_source,
            video_source,
        }
    }

    /// Current cached snapshot; pure read.
    ///
    /// For YouTube, `before` is the `published_at` keyset cursor and at most
    /// 50 rows come back, newest first. Twitch returns every cached live row.
    pub fn feed(&self, platform: Platform, before: Option<i64>) -> Result<Feed, CoreError> {
        match platform {
            Platform::Twitch => Ok(Feed::Twitch(self.stores.feeds.live_snapshot()?)),
            Platform::YouTube => Ok(Feed::YouTube(self.stores.feeds.videos_page(before)?)),
        }
    }

    /// Re-fetch the platform's feed and atomically replace the cache.
    pub async fn refresh(&self, platform: Platform) -> Result<Feed, CoreError> {
        match platform {
            Platform::Twitch => self.refresh_twitch().await,
            Platform::YouTube => self.refresh_youtube().await,
        }
    }

    async fn refresh_twitch(&self) -> Result<Feed, CoreError> {
        let usernames = self.stores.users.usernames(Platform::Twitch)?;

        // Fetch completes before any store lock is taken; a provider failure
        // propagates here and the cached snapshot stays untouched.
        let live = if usernames.is_empty() {
            Vec::new()
        } else {
            self.live_source.live_now(&usernames).await?
        };

        self.stores.feeds.replace_live(&live)?;

        tracing::info!(
            live = live.len(),
            tracked = usernames.len(),
            "Refreshed Twitch feed"
        );
        Ok(Feed::Twitch(live))
    }

    async fn refresh_youtube(&self) -> Result<Feed, CoreError> {
        let channel_ids = self.stores.users.ids(Platform::YouTube)?;

        let videos = if channel_ids.is_empty() {
            Vec::new()
        } else {
            self.video_source.latest_videos(&channel_ids).await?
        };

        self.stores.feeds.replace_videos(&videos)?;

        tracing::info!(
            videos = videos.len(),
            tracked = channel_ids.len(),
            "Refreshed YouTube feed"
        );

        // Initial page: the newest rows of what was just cached.
        let mut page = videos;
        page.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        page.truncate(VIDEO_PAGE_SIZE as usize);
        Ok(Feed::YouTube(page))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use retune_db::users::UserRecord;

    use super::*;
    use crate::testutil::{FakeLive, FakeVideos};

    fn stores_with_twitch_user() -> Stores {
        let stores = Stores::open_in_memory().unwrap();
        stores
            .users
            .upsert(&UserRecord {
                id: "1".into(),
                username: "alice".into(),
                display_name: "Alice".into(),
                avatar: Vec::new(),
                platform: Platform::Twitch,
            })
            .unwrap();
        stores
    }

    fn live(username: &str) -> LiveStream {
        LiveStream {
            username: username.into(),
            started_at: "2024-05-01T18:00:00Z".into(),
        }
    }

    fn video(id: &str, published_at: i64) -> FeedVideo {
        FeedVideo {
            id: id.into(),
            username: "carol".into(),
            title: format!("Video {id}"),
            published_at,
            view_count: "7".into(),
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_live_snapshot() {
        let stores = stores_with_twitch_user();
        stores.feeds.replace_live(&[live("stale")]).unwrap();

        let service = FeedService::new(
            stores.clone(),
            Arc::new(FakeLive::ok(vec![live("alice")])),
            Arc::new(FakeVideos {
                videos: Vec::new(),
                fail: false,
            }),
        );

        let refreshed = service.refresh(Platform::Twitch).await.unwrap();
        let Feed::Twitch(streams) = refreshed else {
            panic!("expected twitch feed");
        };
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].username, "alice");

        let Feed::Twitch(cached) = service.feed(Platform::Twitch, None).unwrap() else {
            panic!("expected twitch feed");
        };
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].username, "alice");
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_cache_untouched() {
        let stores = stores_with_twitch_user();
        stores.feeds.replace_live(&[live("alice")]).unwrap();

        let service = FeedService::new(
            stores.clone(),
            Arc::new(FakeLive::failing()),
            Arc::new(FakeVideos {
                videos: Vec::new(),
                fail: true,
            }),
        );

        let err = service.refresh(Platform::Twitch).await.unwrap_err();
        assert!(matches!(err, CoreError::Provider(_)));

        // Pre-refresh snapshot is still served.
        let Feed::Twitch(cached) = service.feed(Platform::Twitch, None).unwrap() else {
            panic!("expected twitch feed");
        };
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].username, "alice");
    }

    #[tokio::test]
    async fn test_refresh_with_no_tracked_users_skips_fetch() {
        let stores = Stores::open_in_memory().unwrap();

        // The source would fail if called; zero tracked users must not call it.
        let source = Arc::new(FakeLive::failing());
        let service = FeedService::new(
            stores,
            source.clone(),
            Arc::new(FakeVideos {
                videos: Vec::new(),
                fail: true,
            }),
        );

        let Feed::Twitch(streams) = service.refresh(Platform::Twitch).await.unwrap() else {
            panic!("expected twitch feed");
        };
        assert!(streams.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_youtube_refresh_returns_first_page_sorted() {
        let stores = Stores::open_in_memory().unwrap();
        stores
            .users
            .upsert(&UserRecord {
                id: "UC1".into(),
                username: "carol".into(),
                display_name: "Carol".into(),
                avatar: Vec::new(),
                platform: Platform::YouTube,
            })
            .unwrap();

        // Unsorted input: the initial page must still be newest-first.
        let videos: Vec<FeedVideo> = (0..120).map(|i| video(&format!("v{i}"), 1_000 + i)).collect();

        let service = FeedService::new(
            stores.clone(),
            Arc::new(FakeLive::ok(Vec::new())),
            Arc::new(FakeVideos {
                videos,
                fail: false,
            }),
        );

        let Feed::YouTube(page) = service.refresh(Platform::YouTube).await.unwrap() else {
            panic!("expected youtube feed");
        };
        assert_eq!(page.len(), 50);
        assert_eq!(page[0].published_at, 1_119);
        assert_eq!(page[49].published_at, 1_070);

        // Everything is cached, not just the returned page.
        let Feed::YouTube(next) = service
            .feed(Platform::YouTube, Some(page[49].published_at))
            .unwrap()
        else {
            panic!("expected youtube feed");
        };
        assert_eq!(next.len(), 50);
        assert_eq!(next[0].published_at, 1_069);
    }
}
