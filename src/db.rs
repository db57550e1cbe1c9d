// ==========================================
// Roster import - SQLite connection setup
// ==========================================
// Every connection gets the same PRAGMAs: foreign keys must be
// enabled per connection, and so must busy_timeout.
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// schema_version written by `build_schema`
///
/// Used for a warning only; there is no automatic migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the shared PRAGMAs to a connection
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite database file and apply the shared PRAGMAs
pub fn open_sqlite_connection<P: AsRef<Path>>(db_path: P) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path.as_ref())?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// In-memory database with the same PRAGMAs (tests and dry runs)
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read schema_version (None when the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory_connection().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_schema_version_absent() {
        let conn = open_in_memory_connection().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");
        let conn = open_sqlite_connection(&path).unwrap();
        drop(conn);
        assert!(path.exists());
    }
}
