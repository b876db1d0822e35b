//! Upload-feed lookup.

use chrono::{DateTime, Utc};
use futures_util::future;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::channel::string_at;
use crate::{YouTubeClient, YouTubeError};

/// Params token selecting a channel's Videos tab.
const VIDEOS_TAB_PARAMS: &str = "EgZ2aWRlb3PyBgQKAjoA";

/// A video from a channel's uploads tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelVideo {
    pub id: String,
    pub username: String,
    pub title: String,
    pub published_at: i64,
    pub view_count: String,
}

impl YouTubeClient {
    /// Latest uploads for a batch of channels, fetched concurrently.
    ///
    /// A channel that fails is logged and contributes zero rows; the call as
    /// a whole fails only when every channel fetch failed, so a provider
    /// outage is distinguishable from channels with nothing uploaded.
    pub async fn latest_videos(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelVideo>, YouTubeError> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let fetches = channel_ids.iter().map(|id| self.channel_videos(id, now));
        let results = future::join_all(fetches).await;

        let mut videos = Vec::new();
        let mut failed = 0usize;
        for (channel_id, result) in channel_ids.iter().zip(results) {
            match result {
                Ok(mut channel_videos) => videos.append(&mut channel_videos),
                Err(err) => {
                    failed += 1;
                    tracing::warn!(%channel_id, "Failed to fetch channel uploads: {err}");
                }
            }
        }

        if failed == channel_ids.len() {
            return Err(YouTubeError::AllChannelsFailed(failed));
        }

        tracing::debug!(
            videos = videos.len(),
            channels = channel_ids.len(),
            failed,
            "Fetched upload feeds"
        );
        Ok(videos)
    }

    async fn channel_videos(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ChannelVideo>, YouTubeError> {
        let response = self
            .post_json(
                "browse",
                json!({ "browseId": channel_id, "params": VIDEOS_TAB_PARAMS }),
            )
            .await?;

        let username = string_at(&response, "/metadata/channelMetadataRenderer/title");
        if username.is_empty() {
            return Err(YouTubeError::ChannelNotFound(channel_id.to_string()));
        }

        Ok(collect_videos(&response, &username, now))
    }
}

fn collect_videos(response: &Value, username: &str, now: DateTime<Utc>) -> Vec<ChannelVideo> {
    let mut videos = Vec::new();

    for renderer in video_renderers(response) {
        let id = string_at(renderer, "/videoId");
        if id.is_empty() {
            continue;
        }

        // Upcoming and currently-live entries carry no published time; they
        // belong to the live view, not the upload feed.
        let published = string_at(renderer, "/publishedTimeText/simpleText");
        let Some(published_at) = parse_relative_published(&published, now) else {
            continue;
        };

        videos.push(ChannelVideo {
            id,
            username: username.to_string(),
            title: title_text(renderer),
            published_at,
            view_count: view_count_digits(&string_at(renderer, "/viewCountText/simpleText")),
        });
    }

    videos
}

fn video_renderers(response: &Value) -> Vec<&Value> {
    let mut renderers = Vec::new();

    let Some(tabs) = response
        .pointer("/contents/twoColumnBrowseResultsRenderer/tabs")
        .and_then(Value::as_array)
    else {
        return renderers;
    };

    for tab in tabs {
        let Some(contents) = tab
            .pointer("/tabRenderer/content/richGridRenderer/contents")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for entry in contents {
            if let Some(renderer) = entry.pointer("/richItemRenderer/content/videoRenderer") {
                renderers.push(renderer);
            }
        }
    }

    renderers
}

fn title_text(renderer: &Value) -> String {
    let runs = string_at(renderer, "/title/runs/0/text");
    if runs.is_empty() {
        string_at(renderer, "/title/simpleText")
    } else {
        runs
    }
}

/// Approximate a relative published label ("3 weeks ago") as unix seconds.
///
/// Innertube only exposes relative times on the uploads tab; the feed needs
/// an integer for keyset ordering, so an approximation is good enough.
fn parse_relative_published(text: &str, now: DateTime<Utc>) -> Option<i64> {
    let text = text.trim();
    let text = text.strip_prefix("Streamed ").unwrap_or(text);

    let mut parts = text.split_whitespace();
    let amount: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;

    let seconds = match unit.trim_end_matches('s') {
        "second" => 1,
        "minute" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        "week" => 604_800,
        "month" => 2_592_000,
        "year" => 31_536_000,
        _ => return None,
    };

    Some(now.timestamp() - amount * seconds)
}

fn view_count_digits(text: &str) -> String {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { "0".into() } else { digits }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_relative_published() {
        let now = fixed_now();
        let base = now.timestamp();

        assert_eq!(parse_relative_published("1 hour ago", now), Some(base - 3_600));
        assert_eq!(
            parse_relative_published("3 days ago", now),
            Some(base - 3 * 86_400)
        );
        assert_eq!(
            parse_relative_published("Streamed 2 weeks ago", now),
            Some(base - 2 * 604_800)
        );
        assert_eq!(
            parse_relative_published("1 year ago", now),
            Some(base - 31_536_000)
        );
        assert_eq!(parse_relative_published("", now), None);
        assert_eq!(parse_relative_published("LIVE", now), None);
    }

    #[test]
    fn test_view_count_digits() {
        assert_eq!(view_count_digits("12,345 views"), "12345");
        assert_eq!(view_count_digits("No views"), "0");
        assert_eq!(view_count_digits(""), "0");
    }

    #[test]
    fn test_collect_videos_from_browse_response() {
        let response = json!({
            "metadata": {"channelMetadataRenderer": {"title": "Carol's Channel"}},
            "contents": {"twoColumnBrowseResultsRenderer": {"tabs": [
                {"tabRenderer": {"content": {"richGridRenderer": {"contents": [
                    {"richItemRenderer": {"content": {"videoRenderer": {
                        "videoId": "vid1",
                        "title": {"runs": [{"text": "First video"}]},
                        "publishedTimeText": {"simpleText": "2 days ago"},
                        "viewCountText": {"simpleText": "1,000 views"}
                    }}}},
                    {"richItemRenderer": {"content": {"videoRenderer": {
                        "videoId": "vid2",
                        "title": {"runs": [{"text": "Live right now"}]}
                    }}}},
                    {"richItemRenderer": {"content": {"continuationItemRenderer": {}}}}
                ]}}}}
            ]}}
        });

        let videos = collect_videos(&response, "Carol's Channel", fixed_now());
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "vid1");
        assert_eq!(videos[0].title, "First video");
        assert_eq!(videos[0].view_count, "1000");
        assert_eq!(
            videos[0].published_at,
            fixed_now().timestamp() - 2 * 86_400
        );
    }
}
