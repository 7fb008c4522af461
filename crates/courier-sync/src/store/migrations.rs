//! Schema version stamp for the route store.
//!
//! The key-value layout has one version. A fresh database is stamped with it;
//! a database stamped by a newer build is refused rather than rewritten.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create the tables if missing and check or stamp the schema version.
///
/// Existing entries are never touched.
///
/// # Errors
///
/// Returns [`Error::DatabaseMigration`] if the stored version is unreadable or
/// newer than [`CURRENT_VERSION`].
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                (VERSION_KEY, CURRENT_VERSION.to_string()),
            )?;
            Ok(())
        }
        Some(value) => match value.parse::<i32>() {
            Ok(version) if version <= CURRENT_VERSION => Ok(()),
            Ok(version) => Err(Error::DatabaseMigration {
                message: format!(
                    "store was written by schema version {version}, this build supports {CURRENT_VERSION}"
                ),
            }),
            Err(_) => Err(Error::DatabaseMigration {
                message: format!("invalid schema version: {value}"),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_version(conn: &Connection) -> String {
        conn.query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn stamp(conn: &Connection, value: &str) {
        conn.execute(
            "UPDATE metadata SET value = ?1 WHERE key = ?2",
            [value, VERSION_KEY],
        )
        .unwrap();
    }

    #[test]
    fn test_fresh_store_is_stamped() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        assert_eq!(stored_version(&conn), CURRENT_VERSION.to_string());
    }

    #[test]
    fn test_reopen_keeps_cached_route_and_queue() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        for (key, value) in [
            ("@courier_app:current_route", r#"{"id":"route-001"}"#),
            ("@courier_app:pending_confirmations", "[]"),
        ] {
            conn.execute(
                "INSERT INTO entries (key, value) VALUES (?1, ?2)",
                [key, value],
            )
            .unwrap();
        }

        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(stored_version(&conn), CURRENT_VERSION.to_string());
    }

    #[test]
    fn test_store_from_newer_build_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        stamp(&conn, &(CURRENT_VERSION + 1).to_string());

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(err, Error::DatabaseMigration { .. }));
        assert!(err.to_string().contains("this build supports 1"));
    }

    #[test]
    fn test_unreadable_version_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        stamp(&conn, "two");

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version: two"));
    }
}
