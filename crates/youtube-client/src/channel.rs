//! Channel resolution.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::{YouTubeClient, YouTubeError};

/// Search filter restricting results to channels.
const SEARCH_CHANNELS_FILTER: &str = "EgIQAg%3D%3D";

/// Size requested when downloading channel avatars.
const AVATAR_SIZE: u32 = 70;

static THUMB_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"=s\d+").expect("valid regex"));

/// Rewrite the `=sNNN` size selector in a thumbnail url.
fn thumbnail_for_size(url: &str, size: u32) -> String {
    THUMB_SIZE_RE
        .replace(url, format!("=s{size}"))
        .into_owned()
}

/// Resolved channel identity.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl YouTubeClient {
    /// Resolve a channel by its id.
    pub async fn channel_by_id(&self, channel_id: &str) -> Result<Channel, YouTubeError> {
        let response = self
            .post_json("browse", json!({ "browseId": channel_id }))
            .await?;

        let Some(metadata) = response.pointer("/metadata/channelMetadataRenderer") else {
            return Err(YouTubeError::ChannelNotFound(channel_id.to_string()));
        };

        Ok(channel_from_metadata(channel_id, metadata))
    }

    /// Resolve a channel by name via a channel-filtered search.
    ///
    /// Only an exact (case-insensitive) title match counts; anything else is
    /// a typed not-found, never a best-effort guess.
    pub async fn channel_by_name(&self, name: &str) -> Result<Channel, YouTubeError> {
        let response = self
            .post_json(
                "search",
                json!({ "query": name, "params": SEARCH_CHANNELS_FILTER }),
            )
            .await?;

        let Some(channel_id) = find_channel_id(&response, name) else {
            return Err(YouTubeError::ChannelNotFound(name.to_string()));
        };

        self.channel_by_id(&channel_id).await
    }
}

fn channel_from_metadata(channel_id: &str, metadata: &Value) -> Channel {
    let id = match string_at(metadata, "/externalId") {
        id if id.is_empty() => channel_id.to_string(),
        id => id,
    };

    // The handle comes from the vanity url ("https://www.youtube.com/@handle").
    let vanity = string_at(metadata, "/vanityChannelUrl");
    let username = vanity
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_start_matches('@')
        .to_string();

    let avatar_url = string_at(metadata, "/avatar/thumbnails/0/url");
    let avatar_url = if avatar_url.is_empty() {
        avatar_url
    } else {
        thumbnail_for_size(&avatar_url, AVATAR_SIZE)
    };

    Channel {
        id,
        username,
        display_name: string_at(metadata, "/title"),
        avatar_url,
    }
}

fn find_channel_id(response: &Value, name: &str) -> Option<String> {
    let sections = response
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")?
        .as_array()?;

    for section in sections {
        let Some(items) = section
            .pointer("/itemSectionRenderer/contents")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for item in items {
            let Some(renderer) = item.get("channelRenderer") else {
                continue;
            };
            let title = renderer
                .pointer("/title/simpleText")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if title.eq_ignore_ascii_case(name) {
                return renderer
                    .get("channelId")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
        }
    }

    None
}

pub(crate) fn string_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_metadata() {
        let metadata = json!({
            "title": "Carol's Channel",
            "externalId": "UCabc123",
            "vanityChannelUrl": "http://www.youtube.com/@carol",
            "avatar": {"thumbnails": [{"url": "https://example.com/carol=s900.png"}]}
        });

        let channel = channel_from_metadata("UCabc123", &metadata);
        assert_eq!(channel.id, "UCabc123");
        assert_eq!(channel.username, "carol");
        assert_eq!(channel.display_name, "Carol's Channel");
        assert_eq!(channel.avatar_url, "https://example.com/carol=s70.png");
    }

    #[test]
    fn test_thumbnail_for_size() {
        assert_eq!(
            thumbnail_for_size("https://example.com/a=s900-c-k.png", 70),
            "https://example.com/a=s70-c-k.png"
        );
        // No size selector: url passes through untouched.
        assert_eq!(
            thumbnail_for_size("https://example.com/a.png", 70),
            "https://example.com/a.png"
        );
    }

    #[test]
    fn test_find_channel_id_exact_match_only() {
        let response = json!({
            "contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {"sectionListRenderer": {"contents": [
                {"itemSectionRenderer": {"contents": [
                    {"channelRenderer": {"channelId": "UC1", "title": {"simpleText": "Carol Gaming"}}},
                    {"channelRenderer": {"channelId": "UC2", "title": {"simpleText": "Carol"}}}
                ]}}
            ]}}}}
        });

        assert_eq!(find_channel_id(&response, "carol").as_deref(), Some("UC2"));
        assert!(find_channel_id(&response, "dave").is_none());
    }
}
