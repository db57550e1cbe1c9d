// ==========================================
// Roster import - record store
// ==========================================
// Lookup resolver + upsert engine over the relational store.
// Only three statement shapes are issued:
//   SELECT id FROM t WHERE a = ? [AND b = ?] LIMIT 1
//   INSERT INTO t (...) VALUES (...)
//   UPDATE t SET ... WHERE id = ?
// Table names come from EntityKind and column names are
// compile-time constants; values are always bound parameters.
// ==========================================

use crate::db::{open_in_memory_connection, open_sqlite_connection, read_schema_version};
use crate::domain::{EntityKind, UpsertAction};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schema;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

// ==========================================
// Record - ordered field → value mapping
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value for the same field
    pub fn with(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = &(&'static str, Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ==========================================
// KeyRule - identity of a row within its table
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRule {
    Single(&'static str),
    Composite(&'static [&'static str]),
}

impl KeyRule {
    pub fn fields(&self) -> &[&'static str] {
        match self {
            KeyRule::Single(field) => std::slice::from_ref(field),
            KeyRule::Composite(fields) => *fields,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub action: UpsertAction,
}

// ==========================================
// RecordStore
// ==========================================
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Open (or create) the database file; the parent directory is created when missing
    pub fn open<P: AsRef<Path>>(db_path: P) -> RepositoryResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = open_sqlite_connection(path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        debug!(db_path = %path.display(), "database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Shared handle for read-side repositories
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== schema =====

    pub fn build_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        schema::build_schema(&conn)
    }

    pub fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        schema::ensure_schema(&conn)
    }

    pub fn schema_version(&self) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        Ok(read_schema_version(&conn)?)
    }

    // ===== lookup resolver =====

    /// Exact, case-sensitive match on one column
    ///
    /// The value is trimmed first; a blank value resolves to None without a query.
    pub fn resolve(
        &self,
        kind: EntityKind,
        field: &'static str,
        value: &str,
    ) -> RepositoryResult<Option<i64>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 LIMIT 1",
            kind.table_name(),
            field
        );
        let conn = self.get_conn()?;
        let id = conn
            .query_row(&sql, params![value], |row| row.get(0))
            .optional()?;
        trace!(table = %kind, field, value, ?id, "resolve");
        Ok(id)
    }

    /// Every id matching one column, lowest first
    pub fn resolve_all(
        &self,
        kind: EntityKind,
        field: &'static str,
        value: &str,
    ) -> RepositoryResult<Vec<i64>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 ORDER BY id",
            kind.table_name(),
            field
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![value], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Same as `resolve`, restricted to children of `scope_id`
    pub fn resolve_scoped(
        &self,
        kind: EntityKind,
        scope_field: &'static str,
        scope_id: i64,
        field: &'static str,
        value: &str,
    ) -> RepositoryResult<Option<i64>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 AND {} = ?2 LIMIT 1",
            kind.table_name(),
            scope_field,
            field
        );
        let conn = self.get_conn()?;
        let id = conn
            .query_row(&sql, params![scope_id, value], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// Polling place by (electoral seat name, place name)
    ///
    /// Place names repeat across seats, so a name-only lookup is never used.
    pub fn resolve_polling_place(
        &self,
        seat_name: &str,
        place_name: &str,
    ) -> RepositoryResult<Option<i64>> {
        let seat_name = seat_name.trim();
        let place_name = place_name.trim();
        if seat_name.is_empty() || place_name.is_empty() {
            return Ok(None);
        }

        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                r#"
                SELECT pp.id
                FROM polling_place pp
                JOIN electoral_seat s ON pp.electoral_seat_id = s.id
                WHERE s.name = ?1 AND pp.name = ?2
                LIMIT 1
                "#,
                params![seat_name, place_name],
                |row| row.get(0),
            )
            .optional()?;
        trace!(seat_name, place_name, ?id, "resolve polling place");
        Ok(id)
    }

    // ===== upsert engine =====

    /// Update the row matching `key` in place, or insert a new one
    ///
    /// Only non-key fields are written on update; with none left the
    /// update is a no-op. Constraint violations propagate unchanged.
    pub fn upsert(
        &self,
        kind: EntityKind,
        record: &Record,
        key: KeyRule,
    ) -> RepositoryResult<UpsertOutcome> {
        let key_fields = key.fields();
        let mut key_values = Vec::with_capacity(key_fields.len());
        for field in key_fields {
            match record.get(field) {
                Some(value) => key_values.push(value.clone()),
                None => {
                    return Err(RepositoryError::InvalidRecord {
                        table: kind.table_name().to_string(),
                        message: format!("key field '{}' missing", field),
                    })
                }
            }
        }

        let where_clause = key_fields
            .iter()
            .enumerate()
            .map(|(idx, field)| format!("{} = ?{}", field, idx + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "SELECT id FROM {} WHERE {} LIMIT 1",
            kind.table_name(),
            where_clause
        );

        let conn = self.get_conn()?;
        let existing: Option<i64> = conn
            .query_row(&sql, params_from_iter(key_values.iter()), |row| row.get(0))
            .optional()?;

        match existing {
            Some(id) => {
                let updates: Vec<&(&'static str, Value)> = record
                    .fields()
                    .filter(|(field, _)| !key_fields.contains(field))
                    .collect();
                if !updates.is_empty() {
                    update_by_id(&conn, kind, &updates, id)?;
                }
                debug!(table = %kind, id, "row updated");
                Ok(UpsertOutcome {
                    id,
                    action: UpsertAction::Updated,
                })
            }
            None => {
                let id = insert(&conn, kind, record)?;
                debug!(table = %kind, id, "row inserted");
                Ok(UpsertOutcome {
                    id,
                    action: UpsertAction::Inserted,
                })
            }
        }
    }

    /// Plain insert, returns the generated id
    pub fn insert_record(&self, kind: EntityKind, record: &Record) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        insert(&conn, kind, record)
    }

    /// Update the given fields of row `id`; false when no row matched
    pub fn update_record(
        &self,
        kind: EntityKind,
        record: &Record,
        id: i64,
    ) -> RepositoryResult<bool> {
        if record.is_empty() {
            return Ok(false);
        }
        let conn = self.get_conn()?;
        let fields: Vec<&(&'static str, Value)> = record.fields().collect();
        Ok(update_by_id(&conn, kind, &fields, id)? > 0)
    }

    /// Row count of every entity table, in import order
    pub fn table_counts(&self) -> RepositoryResult<Vec<(EntityKind, i64)>> {
        let conn = self.get_conn()?;
        let mut counts = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            counts.push((kind, count));
        }
        Ok(counts)
    }
}

fn insert(conn: &Connection, kind: EntityKind, record: &Record) -> RepositoryResult<i64> {
    if record.is_empty() {
        return Err(RepositoryError::InvalidRecord {
            table: kind.table_name().to_string(),
            message: "no fields to insert".to_string(),
        });
    }

    let columns = record
        .fields()
        .map(|(field, _)| *field)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=record.len())
        .map(|idx| format!("?{}", idx))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table_name(),
        columns,
        placeholders
    );

    conn.execute(&sql, params_from_iter(record.fields().map(|(_, v)| v)))?;
    Ok(conn.last_insert_rowid())
}

fn update_by_id(
    conn: &Connection,
    kind: EntityKind,
    fields: &[&(&'static str, Value)],
    id: i64,
) -> RepositoryResult<usize> {
    let assignments = fields
        .iter()
        .enumerate()
        .map(|(idx, (field, _))| format!("{} = ?{}", field, idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        kind.table_name(),
        assignments,
        fields.len() + 1
    );

    let mut values: Vec<Value> = fields.iter().map(|(_, v)| v.clone()).collect();
    values.push(Value::Integer(id));
    Ok(conn.execute(&sql, params_from_iter(values.iter()))?)
}
