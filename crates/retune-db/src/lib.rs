//! SQLite storage layer for the retune application.
//!
//! State is split across three independent databases (users, feeds, emotes),
//! each carrying its own schema version in `PRAGMA user_version` and migrated
//! on open. One process owns the files; within the process each domain is
//! serialized by its own connection lock.

pub mod emotes;
pub mod feeds;
pub mod migrate;
pub mod schema;
pub mod users;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Streaming platform a tracked user belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    YouTube,
}

impl Platform {
    /// Table used for this platform inside every domain database.
    pub fn table(self) -> &'static str {
        match self {
            Platform::Twitch => "twitch",
            Platform::YouTube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Thread-safe handle wrapping a single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database file and bring it to the latest schema version.
    pub fn open(
        path: impl AsRef<Path>,
        domain: &str,
        migrations: &[migrate::Migration],
    ) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::from_conn(conn, domain, migrations)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory(
        domain: &str,
        migrations: &[migrate::Migration],
    ) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::from_conn(conn, domain, migrations)
    }

    fn from_conn(
        conn: Connection,
        domain: &str,
        migrations: &[migrate::Migration],
    ) -> Result<Self, DbError> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.configure()?;
        db.with_conn_mut(|conn| migrate::migrate(domain, conn, migrations))?;
        Ok(db)
    }

    /// Access the underlying connection with a closure.
    pub fn with_conn<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Connection) -> Result<R, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Access the underlying connection mutably (for transactions).
    pub fn with_conn_mut<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut Connection) -> Result<R, DbError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&mut conn)
    }

    fn configure(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA busy_timeout=5000;",
            )?;
            Ok(())
        })
    }
}

/// The three domain stores, opened and migrated together.
///
/// A migration failure in any domain aborts the open; callers must not run
/// against a partially migrated store.
#[derive(Clone)]
pub struct Stores {
    pub users: users::UsersStore,
    pub feeds: feeds::FeedsStore,
    pub emotes: emotes::EmotesStore,
}

impl Stores {
    /// Open `users.db`, `feeds.db` and `emotes.db` under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DbError> {
        let dir = dir.as_ref();
        Ok(Self {
            users: users::UsersStore::open(dir.join("users.db"))?,
            feeds: feeds::FeedsStore::open(dir.join("feeds.db"))?,
            emotes: emotes::EmotesStore::open(dir.join("emotes.db"))?,
        })
    }

    /// In-memory stores (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self {
            users: users::UsersStore::open_in_memory()?,
            feeds: feeds::FeedsStore::open_in_memory()?,
            emotes: emotes::EmotesStore::open_in_memory()?,
        })
    }
}

/// Storage error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Migration '{description}' (v{version}) failed for domain '{domain}': {source}")]
    Migration {
        domain: String,
        version: i64,
        description: &'static str,
        #[source]
        source: Box<DbError>,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
