//! Application core for retune.
//!
//! Wires the domain stores to the platform clients and exposes the operation
//! boundary the UI layer calls: user registry, feed synchronization and emote
//! aggregation. Nothing here renders or owns windows; the shell is expected
//! to hold an [`App`] and call into it.

pub mod bootstrap;
pub mod emotes;
pub mod feed;
pub mod providers;
pub mod registry;

use std::sync::Arc;

pub use retune_db::{Platform, Stores};

use crate::emotes::EmoteService;
use crate::feed::FeedService;
use crate::providers::ProviderError;
use crate::registry::UserRegistry;

/// Unified error type for core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] retune_db::DbError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidInput(&'static str),

    #[error("All emote sources failed for '{0}'")]
    EmoteSourcesFailed(String),
}

/// The assembled application: every exposed operation hangs off this.
pub struct App {
    pub registry: UserRegistry,
    pub feeds: FeedService,
    pub emotes: Arc<EmoteService>,
}
