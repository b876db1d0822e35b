//! Versioned schema migrations.
//!
//! Each domain database tracks its schema version in `PRAGMA user_version`.
//! Pending migrations are applied in ascending order inside a single
//! transaction: a failure rolls the whole batch back and the stored version
//! stays where it was. There is no downgrade path, so migrations must stay
//! additive.

use rusqlite::Connection;

use crate::DbError;

/// A single schema upgrade step.
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub apply: fn(&Connection) -> Result<(), DbError>,
}

/// Bring `conn` up to the highest version in `migrations`.
///
/// A stored version above the highest known one is not handled here; the
/// file was written by a newer build and must not be opened by this one.
pub fn migrate(
    domain: &str,
    conn: &mut Connection,
    migrations: &[Migration],
) -> Result<(), DbError> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let target = migrations.iter().map(|m| m.version).max().unwrap_or(0);

    if current == target {
        return Ok(());
    }

    let mut pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| m.version > current && m.version <= target)
        .collect();
    pending.sort_by_key(|m| m.version);

    let tx = conn.transaction()?;
    for migration in pending {
        tracing::info!(
            domain,
            version = migration.version,
            "Applying: {}",
            migration.description
        );
        (migration.apply)(&tx).map_err(|source| DbError::Migration {
            domain: domain.to_string(),
            version: migration.version,
            description: migration.description,
            source: Box::new(source),
        })?;
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;

    tracing::info!(domain, version = target, "Schema upgraded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap()
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    fn create_a(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch("CREATE TABLE a (id INTEGER PRIMARY KEY);")?;
        Ok(())
    }

    fn create_b(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch("CREATE TABLE b (id INTEGER PRIMARY KEY);")?;
        Ok(())
    }

    fn broken(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch("THIS IS NOT SQL;")?;
        Ok(())
    }

    #[test]
    fn test_applies_pending_in_order() {
        let mut conn = Connection::open_in_memory().unwrap();

        // Deliberately out of order in the list; the runner sorts.
        let migrations = [
            Migration {
                version: 2,
                description: "create b",
                apply: create_b,
            },
            Migration {
                version: 1,
                description: "create a",
                apply: create_a,
            },
        ];

        migrate("test", &mut conn, &migrations).unwrap();
        assert_eq!(stored_version(&conn), 2);
        assert!(table_exists(&conn, "a"));
        assert!(table_exists(&conn, "b"));
    }

    #[test]
    fn test_noop_when_up_to_date() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrations = [Migration {
            version: 1,
            description: "create a",
            apply: create_a,
        }];

        migrate("test", &mut conn, &migrations).unwrap();
        migrate("test", &mut conn, &migrations).unwrap();
        assert_eq!(stored_version(&conn), 1);
    }

    #[test]
    fn test_skips_already_applied_versions() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(
            "test",
            &mut conn,
            &[Migration {
                version: 1,
                description: "create a",
                apply: create_a,
            }],
        )
        .unwrap();

        // v1 would fail if re-run (table exists); only v2 may apply.
        migrate(
            "test",
            &mut conn,
            &[
                Migration {
                    version: 1,
                    description: "create a",
                    apply: create_a,
                },
                Migration {
                    version: 2,
                    description: "create b",
                    apply: create_b,
                },
            ],
        )
        .unwrap();
        assert_eq!(stored_version(&conn), 2);
        assert!(table_exists(&conn, "b"));
    }

    #[test]
    fn test_failed_batch_rolls_back_completely() {
        let mut conn = Connection::open_in_memory().unwrap();

        let migrations = [
            Migration {
                version: 1,
                description: "create a",
                apply: create_a,
            },
            Migration {
                version: 2,
                description: "broken",
                apply: broken,
            },
        ];

        let err = migrate("test", &mut conn, &migrations).unwrap_err();
        match err {
            DbError::Migration {
                domain, version, ..
            } => {
                assert_eq!(domain, "test");
                assert_eq!(version, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Neither the version bump nor the first step's effects persist.
        assert_eq!(stored_version(&conn), 0);
        assert!(!table_exists(&conn, "a"));
    }
}
