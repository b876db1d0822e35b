//! Tracked user storage.

use std::path::Path;

use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, Platform, schema};

/// A tracked creator on one platform.
///
/// Identity is `(platform, id)`; `username` is unique within a platform and
/// used for lookups, but `id` is the durable key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Vec<u8>,
    pub platform: Platform,
}

/// Store for the users domain.
#[derive(Clone)]
pub struct UsersStore {
    db: Database,
}

impl UsersStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open(path, schema::USERS_DOMAIN, schema::USERS)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self {
            db: Database::open_in_memory(schema::USERS_DOMAIN, schema::USERS)?,
        })
    }

    /// Insert a user, or refresh avatar and display name when the id already
    /// exists. `id` and `username` never change after creation.
    pub fn upsert(&self, user: &UserRecord) -> Result<(), DbError> {
        let sql = format!(
            "INSERT INTO {} (id, username, display_name, avatar) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE SET avatar = ?4, display_name = ?3",
            user.platform.table()
        );
        self.db.with_conn(|conn| {
            conn.execute(
                &sql,
                params![user.id, user.username, user.display_name, user.avatar],
            )?;
            Ok(())
        })
    }

    pub fn by_username(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Option<UserRecord>, DbError> {
        self.fetch_one(platform, "username", username)
    }

    pub fn by_id(&self, platform: Platform, id: &str) -> Result<Option<UserRecord>, DbError> {
        self.fetch_one(platform, "id", id)
    }

    fn fetch_one(
        &self,
        platform: Platform,
        column: &str,
        value: &str,
    ) -> Result<Option<UserRecord>, DbError> {
        let sql = format!(
            "SELECT id, username, display_name, avatar FROM {} WHERE {column} = ?1",
            platform.table()
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let user = stmt
                .query_row([value], |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        avatar: row.get::<_, Option<Vec<u8>>>(3)?.unwrap_or_default(),
                        platform,
                    })
                })
                .optional()?;
            Ok(user)
        })
    }

    pub fn list(&self, platform: Platform) -> Result<Vec<UserRecord>, DbError> {
        let sql = format!(
            "SELECT id, username, display_name, avatar FROM {}",
            platform.table()
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    display_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    avatar: row.get::<_, Option<Vec<u8>>>(3)?.unwrap_or_default(),
                    platform,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// All tracked usernames for a platform (Twitch feed refresh input).
    pub fn usernames(&self, platform: Platform) -> Result<Vec<String>, DbError> {
        self.identifiers(platform, "username")
    }

    /// All tracked ids for a platform (YouTube feed refresh input).
    pub fn ids(&self, platform: Platform) -> Result<Vec<String>, DbError> {
        self.identifiers(platform, "id")
    }

    fn identifiers(&self, platform: Platform, column: &str) -> Result<Vec<String>, DbError> {
        let sql = format!("SELECT {column} FROM {}", platform.table());
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    pub fn delete(&self, platform: Platform, username: &str) -> Result<(), DbError> {
        let sql = format!("DELETE FROM {} WHERE username = ?1", platform.table());
        self.db.with_conn(|conn| {
            conn.execute(&sql, [username])?;
            Ok(())
        })
    }
}
