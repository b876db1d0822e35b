//! Emote lookup.
//!
//! Emotes come from three places: the channel's own subscription products
//! (carried on the identity query), 7TV and BetterTTV. Each fetch returns a
//! name-keyed map; merging across sources is the caller's concern.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gql::SubscriptionProduct;
use crate::{TwitchClient, TwitchError};

const TWITCH_EMOTES_CDN: &str = "https://static-cdn.jtvnw.net/emoticons/v2";
const SEVENTV_API: &str = "https://7tv.io/v3";
const BETTERTTV_API: &str = "https://api.betterttv.net/3";

/// A single emote with its display dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emote {
    pub name: String,
    pub url: String,
    pub width: i64,
    pub height: i64,
}

/// Flatten subscription emote products into a name-keyed map.
///
/// Product emotes carry no image payload, only an id; the url points at the
/// static CDN at 1.0 scale (28x28).
pub fn from_subscription_products(products: &[SubscriptionProduct]) -> HashMap<String, Emote> {
    let mut emotes = HashMap::new();

    for product in products {
        for emote in &product.emotes {
            let name = emote.token.clone();
            emotes.insert(
                name.clone(),
                Emote {
                    name,
                    url: format!("{TWITCH_EMOTES_CDN}/{}/default/dark/1.0", emote.id),
                    width: 28,
                    height: 28,
                },
            );
        }
    }

    emotes
}

#[derive(Debug, Deserialize)]
struct SevenTvResponse {
    #[serde(default)]
    emote_set: Option<SevenTvEmoteSet>,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmoteSet {
    #[serde(default)]
    emotes: Vec<SevenTvEmote>,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmote {
    name: String,
    data: SevenTvEmoteData,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmoteData {
    host: SevenTvHost,
}

#[derive(Debug, Deserialize)]
struct SevenTvHost {
    url: String,
    #[serde(default)]
    files: Vec<SevenTvFile>,
}

#[derive(Debug, Deserialize)]
struct SevenTvFile {
    name: String,
    width: i64,
    height: i64,
    format: String,
}

/// Encoding preference, best first. Unknown formats rank last.
fn format_rank(format: &str) -> u8 {
    match format.to_ascii_uppercase().as_str() {
        "AVIF" => 0,
        "WEBP" => 1,
        "PNG" => 2,
        "GIF" => 3,
        _ => 4,
    }
}

/// Pick one encoded variant among a logical emote's 1x-scale files.
fn best_file(files: &[SevenTvFile]) -> Option<&SevenTvFile> {
    files
        .iter()
        .filter(|file| file.name.starts_with('1'))
        .min_by_key(|file| format_rank(&file.format))
}

#[derive(Debug, Deserialize)]
struct BetterTtvResponse {
    #[serde(rename = "channelEmotes", default)]
    channel_emotes: Vec<BetterTtvEmote>,
    #[serde(rename = "sharedEmotes", default)]
    shared_emotes: Vec<BetterTtvEmote>,
}

#[derive(Debug, Deserialize)]
struct BetterTtvEmote {
    id: String,
    code: String,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    height: Option<i64>,
}

impl TwitchClient {
    /// The user's 7TV emote set. A user without a set yields an empty map.
    pub async fn seventv_emotes(&self, user_id: &str) -> Result<HashMap<String, Emote>, TwitchError> {
        let response: SevenTvResponse = self
            .get_json(&format!("{SEVENTV_API}/users/twitch/{user_id}"))
            .await?;

        let Some(set) = response.emote_set else {
            return Ok(HashMap::new());
        };

        let mut emotes = HashMap::new();
        for emote in set.emotes {
            let host = emote.data.host;
            let Some(file) = best_file(&host.files) else {
                continue;
            };
            let record = Emote {
                name: emote.name.clone(),
                url: format!("https:{}/{}", host.url, file.name),
                width: file.width,
                height: file.height,
            };
            emotes.insert(emote.name, record);
        }

        tracing::debug!(count = emotes.len(), user_id, "Fetched 7TV emotes");
        Ok(emotes)
    }

    /// The user's BetterTTV channel and shared emotes.
    pub async fn betterttv_emotes(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, Emote>, TwitchError> {
        let response: BetterTtvResponse = self
            .get_json(&format!("{BETTERTTV_API}/cached/users/twitch/{user_id}"))
            .await?;

        let mut emotes = HashMap::new();
        for emote in response
            .channel_emotes
            .into_iter()
            .chain(response.shared_emotes)
        {
            let record = Emote {
                name: emote.code.clone(),
                url: format!("https://cdn.betterttv.net/emote/{}/1x", emote.id),
                width: emote.width.unwrap_or(28),
                height: emote.height.unwrap_or(28),
            };
            emotes.insert(emote.code, record);
        }

        tracing::debug!(count = emotes.len(), user_id, "Fetched BetterTTV emotes");
        Ok(emotes)
    }
}
