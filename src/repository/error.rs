// ==========================================
// Roster import - repository error type
// ==========================================
// Constraint violations are row-level: the converter logs them and
// moves on. Everything else aborts the run.
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== row-level (constraint) errors =====
    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    // ===== run-level errors =====
    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("database lock failed: {0}")]
    LockError(String),

    #[error("database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("schema missing tables: {} (run build-schema first)", .tables.join(", "))]
    SchemaMissing { tables: Vec<String> },

    #[error("invalid record for {table}: {message}")]
    InvalidRecord { table: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// True when only the current row is affected and the batch may continue
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            RepositoryError::UniqueConstraintViolation(_)
                | RepositoryError::ForeignKeyViolation(_)
                | RepositoryError::ConstraintViolation(_)
        )
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                let msg = msg.unwrap_or_else(|| ffi_err.to_string());
                match ffi_err.code {
                    ErrorCode::ConstraintViolation => {
                        if msg.contains("UNIQUE") {
                            RepositoryError::UniqueConstraintViolation(msg)
                        } else if msg.contains("FOREIGN KEY") {
                            RepositoryError::ForeignKeyViolation(msg)
                        } else {
                            RepositoryError::ConstraintViolation(msg)
                        }
                    }
                    ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::PermissionDenied
                    | ErrorCode::ReadOnly
                    | ErrorCode::SystemIoFailure => RepositoryError::DatabaseConnectionError(msg),
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_violation_is_row_level() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert!(err.is_row_level());
    }

    #[test]
    fn test_not_null_violation_is_row_level() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT NOT NULL);").unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES (NULL)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
        assert!(err.is_row_level());
    }

    #[test]
    fn test_missing_table_is_run_level() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO nope VALUES (1)", [])
            .unwrap_err()
            .into();
        assert!(!err.is_row_level());
    }
}
