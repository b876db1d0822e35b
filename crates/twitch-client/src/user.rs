//! Channel identity lookup.

use std::collections::HashMap;

use crate::emotes::{Emote, from_subscription_products};
use crate::gql::{PersistedOperation, TurboAndSubUpsellResponse};
use crate::{TwitchClient, TwitchError};

/// Resolved channel identity plus the channel's subscription emotes.
#[derive(Debug, Clone)]
pub struct TwitchChannel {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub avatar_url: String,
    pub subscription_emotes: HashMap<String, Emote>,
}

impl TwitchClient {
    /// Resolve a channel by login name.
    ///
    /// The same operation carries the subscription emote products, so they
    /// come back with the identity at no extra round trip.
    pub async fn fetch_channel(&self, login: &str) -> Result<TwitchChannel, TwitchError> {
        let query = PersistedOperation::turbo_and_sub_upsell(login);
        let response: TurboAndSubUpsellResponse = self.send_query(&query).await?;

        let Some(user) = response.data.user else {
            return Err(TwitchError::UserNotFound(login.to_string()));
        };

        let subscription_emotes = from_subscription_products(&user.subscription_products);

        Ok(TwitchChannel {
            id: user.id,
            login: login.to_string(),
            display_name: user.display_name,
            avatar_url: user.profile_image_url,
            subscription_emotes,
        })
    }
}
