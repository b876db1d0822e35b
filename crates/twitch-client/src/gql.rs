//! Persisted GraphQL operations against the public Twitch web API.
//!
//! Only anonymous, hash-pinned operations are used; there is no OAuth flow.

use serde::{Deserialize, Serialize};

pub(crate) const GQL_ENDPOINT: &str = "https://gql.twitch.tv/gql";

/// Client id of the public web player. Anonymous queries only.
pub(crate) const CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

const USE_LIVE_HASH: &str = "639d5f11bfb8bf3053b424d9ef650d04c4ebb7d94711d644afb08fe9a0fad5d9";

const TURBO_AND_SUB_UPSELL_HASH: &str =
    "5dbca380e47e37808c89479f51f789990ec653428a01b76c649ebe01afb3aa7e";

/// A persisted operation addressed by its sha256 hash.
#[derive(Debug, Serialize)]
pub struct PersistedOperation {
    #[serde(rename = "operationName")]
    operation_name: &'static str,
    variables: ChannelLoginVariables,
    extensions: Extensions,
}

impl PersistedOperation {
    /// Live status for one channel login.
    pub fn use_live(login: &str) -> Self {
        Self::new("UseLive", USE_LIVE_HASH, login)
    }

    /// Channel identity plus subscription emote products.
    pub fn turbo_and_sub_upsell(login: &str) -> Self {
        Self::new("TurboAndSubUpsell", TURBO_AND_SUB_UPSELL_HASH, login)
    }

    fn new(operation_name: &'static str, hash: &'static str, login: &str) -> Self {
        Self {
            operation_name,
            variables: ChannelLoginVariables {
                channel_login: login.to_string(),
            },
            extensions: Extensions {
                persisted_query: PersistedQuery {
                    version: 1,
                    sha256_hash: hash,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChannelLoginVariables {
    #[serde(rename = "channelLogin")]
    channel_login: String,
}

#[derive(Debug, Serialize)]
struct Extensions {
    #[serde(rename = "persistedQuery")]
    persisted_query: PersistedQuery,
}

#[derive(Debug, Serialize)]
struct PersistedQuery {
    version: u32,
    #[serde(rename = "sha256Hash")]
    sha256_hash: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct UseLiveResponse {
    pub data: UseLiveData,
}

#[derive(Debug, Deserialize)]
pub struct UseLiveData {
    #[serde(default)]
    pub user: Option<UseLiveUser>,
}

#[derive(Debug, Deserialize)]
pub struct UseLiveUser {
    pub login: String,
    #[serde(default)]
    pub stream: Option<StreamMeta>,
}

#[derive(Debug, Deserialize)]
pub struct StreamMeta {
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TurboAndSubUpsellResponse {
    pub data: TurboAndSubUpsellData,
}

#[derive(Debug, Deserialize)]
pub struct TurboAndSubUpsellData {
    #[serde(default)]
    pub user: Option<ChannelData>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelData {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "profileImageURL", default)]
    pub profile_image_url: String,
    #[serde(rename = "subscriptionProducts", default)]
    pub subscription_products: Vec<SubscriptionProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionProduct {
    #[serde(default)]
    pub emotes: Vec<ProductEmote>,
}

#[derive(Debug, Deserialize)]
pub struct ProductEmote {
    pub id: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_live_batch_response_decodes() {
        let body = r#"[
            {"data": {"user": {"login": "alice", "stream": {"createdAt": "2024-05-01T18:03:00Z"}}}},
            {"data": {"user": {"login": "bob", "stream": null}}},
            {"data": {"user": null}}
        ]"#;

        let parsed: Vec<UseLiveResponse> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.len(), 3);

        let alice = parsed[0].data.user.as_ref().unwrap();
        assert_eq!(alice.login, "alice");
        assert_eq!(
            alice.stream.as_ref().unwrap().created_at,
            "2024-05-01T18:03:00Z"
        );

        assert!(parsed[1].data.user.as_ref().unwrap().stream.is_none());
        assert!(parsed[2].data.user.is_none());
    }

    #[test]
    fn test_channel_response_decodes() {
        let body = r#"{
            "data": {
                "user": {
                    "id": "12345",
                    "displayName": "Alice",
                    "profileImageURL": "https://example.com/alice.png",
                    "subscriptionProducts": [
                        {"emotes": [{"id": "e1", "token": "aliceHi"}]}
                    ]
                }
            }
        }"#;

        let parsed: TurboAndSubUpsellResponse = serde_json::from_str(body).unwrap();
        let user = parsed.data.user.unwrap();
        assert_eq!(user.id, "12345");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.subscription_products[0].emotes[0].token, "aliceHi");
    }

    #[test]
    fn test_persisted_operation_serializes_hash() {
        let op = PersistedOperation::use_live("alice");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operationName"], "UseLive");
        assert_eq!(json["variables"]["channelLogin"], "alice");
        assert_eq!(json["extensions"]["persistedQuery"]["version"], 1);
    }
}
