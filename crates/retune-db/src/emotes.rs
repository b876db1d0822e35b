//! Per-user emote set storage.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, schema};

/// A single emote, keyed by name within a user's set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteRecord {
    pub name: String,
    pub url: String,
    pub width: i64,
    pub height: i64,
}

/// Store for the emotes domain.
#[derive(Clone)]
pub struct EmotesStore {
    db: Database,
}

impl EmotesStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open(path, schema::EMOTES_DOMAIN, schema::EMOTES)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open_in_memory(schema::EMOTES_DOMAIN, schema::EMOTES)?,
        })
    }

    /// The user's cached emote set, keyed by emote name.
    pub fn for_user(&self, username: &str) -> Result<HashMap<String, EmoteRecord>, DbError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, url, width, height FROM twitch WHERE username = ?1")?;
            let rows = stmt.query_map([username], |row| {
                Ok(EmoteRecord {
                    name: row.get(0)?,
                    url: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    width: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                    height: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                })
            })?;

            let mut emotes = HashMap::new();
            for row in rows {
                let emote = row?;
                emotes.insert(emote.name.clone(), emote);
            }
            Ok(emotes)
        })
    }

    /// Replace the user's emote set in one transaction.
    ///
    /// An empty set is a no-op: a transient all-sources-degraded fetch must
    /// never erase a previously populated set. Entries with a blank name are
    /// skipped on insert.
    pub fn replace_for_user(
        &self,
        username: &str,
        emotes: &HashMap<String, EmoteRecord>,
    ) -> Result<(), DbError> {
        if username.is_empty() {
            return Err(DbError::InvalidData("username is empty".into()));
        }
        if emotes.is_empty() {
            return Ok(());
        }

        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM twitch WHERE username = ?1", [username])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO twitch (username, name, url, width, height)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (name, emote) in emotes {
                    if name.is_empty() {
                        continue;
                    }
                    stmt.execute(params![username, name, emote.url, emote.width, emote.height])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Drop a removed user's emote rows.
    pub fn delete_for_user(&self, username: &str) -> Result<(), DbError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM twitch WHERE username = ?1", [username])?;
            Ok(())
        })
    }
}
