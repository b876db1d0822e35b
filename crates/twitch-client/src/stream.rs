//! Live-status lookup.

use serde::{Deserialize, Serialize};

use crate::gql::{PersistedOperation, UseLiveResponse};
use crate::{TwitchClient, TwitchError};

/// A channel that is currently live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveNow {
    pub username: String,
    pub started_at: String,
}

impl TwitchClient {
    /// Live status for a batch of logins in one round trip.
    ///
    /// The whole batch is sent as a single GraphQL request. Channels that are
    /// offline or unknown are simply absent from the result.
    pub async fn live_now(&self, usernames: &[String]) -> Result<Vec<LiveNow>, TwitchError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let query: Vec<PersistedOperation> = usernames
            .iter()
            .filter(|username| !username.is_empty())
            .map(|username| PersistedOperation::use_live(username))
            .collect();

        let responses: Vec<UseLiveResponse> = self.send_query(&query).await?;

        let mut live = Vec::new();
        for response in responses {
            let Some(user) = response.data.user else {
                continue;
            };
            let Some(stream) = user.stream else {
                continue;
            };
            live.push(LiveNow {
                username: user.login,
                started_at: stream.created_at,
            });
        }

        tracing::debug!(
            live = live.len(),
            queried = usernames.len(),
            "Fetched live status"
        );
        Ok(live)
    }
}
