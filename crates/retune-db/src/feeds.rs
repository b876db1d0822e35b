//! Feed snapshot storage.
//!
//! Feed tables are snapshots, not history: a refresh replaces the whole
//! platform table inside one transaction, so readers see either the old
//! snapshot or the new one, never a mix and never an empty in-between state.

use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, Platform, schema};

/// Rows returned per page of the YouTube feed.
pub const VIDEO_PAGE_SIZE: i64 = 50;

/// A channel that is currently live. Row existence is the live signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStream {
    pub username: String,
    pub started_at: String,
}

/// A cached video from a tracked channel's upload feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedVideo {
    pub id: String,
    pub username: String,
    pub title: String,
    pub published_at: i64,
    pub view_count: String,
}

/// Store for the feeds domain.
#[derive(Clone)]
pub struct FeedsStore {
    db: Database,
}

impl FeedsStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open(path, schema::FEEDS_DOMAIN, schema::FEEDS)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open_in_memory(schema::FEEDS_DOMAIN, schema::FEEDS)?,
        })
    }

    /// All cached live rows. Bounded by the tracked-user count, so no paging.
    pub fn live_snapshot(&self) -> Result<Vec<LiveStream>, DbError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT username, started_at FROM twitch")?;
            let rows = stmt.query_map([], |row| {
                Ok(LiveStream {
                    username: row.get(0)?,
                    started_at: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Replace the live snapshot in one transaction.
    pub fn replace_live(&self, streams: &[LiveStream]) -> Result<(), DbError> {
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM twitch", [])?;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO twitch (username, started_at) VALUES (?1, ?2)")?;
                for stream in streams {
                    stmt.execute(params![stream.username, stream.started_at])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// One page of cached videos, newest first.
    ///
    /// `before` is the `published_at` of the last row already seen (keyset
    /// pagination). Rows sharing a `published_at` have no guaranteed relative
    /// order.
    pub fn videos_page(&self, before: Option<i64>) -> Result<Vec<FeedVideo>, DbError> {
        self.db.with_conn(|conn| {
            let map = |row: &rusqlite::Row<'_>| {
                Ok(FeedVideo {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    published_at: row.get(3)?,
                    view_count: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            };

            let rows = match before {
                Some(cursor) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, username, title, published_at, view_count FROM youtube
                         WHERE published_at < ?1 ORDER BY published_at DESC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![cursor, VIDEO_PAGE_SIZE], map)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, username, title, published_at, view_count FROM youtube
                         ORDER BY published_at DESC LIMIT ?1",
                    )?;
                    let rows = stmt.query_map(params![VIDEO_PAGE_SIZE], map)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    /// Replace the cached video feed in one transaction.
    pub fn replace_videos(&self, videos: &[FeedVideo]) -> Result<(), DbError> {
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM youtube", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO youtube (id, username, title, published_at, view_count)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for video in videos {
                    stmt.execute(params![
                        video.id,
                        video.username,
                        video.title,
                        video.published_at,
                        video.view_count
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Drop a removed user's feed rows.
    pub fn delete_for_user(&self, platform: Platform, username: &str) -> Result<(), DbError> {
        let sql = format!("DELETE FROM {} WHERE username = ?1", platform.table());
        self.db.with_conn(|conn| {
            conn.execute(&sql, [username])?;
            Ok(())
        })
    }
}
