//! Domain schema definitions.
//!
//! Each domain carries its own ordered migration list; the stores hand these
//! to [`crate::migrate::migrate`] on open.

use rusqlite::Connection;

use crate::DbError;
use crate::migrate::Migration;

pub const USERS_DOMAIN: &str = "users";
pub const FEEDS_DOMAIN: &str = "feeds";
pub const EMOTES_DOMAIN: &str = "emotes";

pub static USERS: &[Migration] = &[Migration {
    version: 1,
    description: "Create users tables",
    apply: users_v1,
}];

pub static FEEDS: &[Migration] = &[Migration {
    version: 1,
    description: "Create feeds tables",
    apply: feeds_v1,
}];

pub static EMOTES: &[Migration] = &[Migration {
    version: 1,
    description: "Create emotes table",
    apply: emotes_v1,
}];

fn users_v1(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS twitch (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            display_name TEXT,
            avatar BLOB
        );

        CREATE TABLE IF NOT EXISTS youtube (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            display_name TEXT,
            avatar BLOB
        );",
    )?;
    Ok(())
}

fn feeds_v1(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS twitch (
            username TEXT PRIMARY KEY,
            started_at TEXT
        );

        CREATE TABLE IF NOT EXISTS youtube (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            title TEXT,
            published_at INTEGER,
            view_count TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_title ON youtube (title);
        CREATE INDEX IF NOT EXISTS idx_published_at ON youtube (published_at);",
    )?;
    Ok(())
}

fn emotes_v1(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS twitch (
            username TEXT NOT NULL,
            name TEXT NOT NULL,
            url TEXT,
            width INTEGER,
            height INTEGER,
            PRIMARY KEY (username, name)
        );",
    )?;
    Ok(())
}
