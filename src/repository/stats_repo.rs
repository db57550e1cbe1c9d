// ==========================================
// Roster import - statistics repository
// ==========================================
// Read side for `report-stats`: per-table counts and the
// urban/rural split of operators and notaries via the views.
// ==========================================

use crate::db::{read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::{AreaType, EntityKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub entity: EntityKind,
    pub rows: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AreaBreakdown {
    pub urban: i64,
    pub rural: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub schema_version: Option<i64>,
    pub tables: Vec<TableCount>,
    pub operators_by_area: AreaBreakdown,
    pub notaries_by_area: AreaBreakdown,
}

impl StoreStats {
    pub fn total_rows(&self) -> i64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn rows(&self, entity: EntityKind) -> i64 {
        self.tables
            .iter()
            .find(|t| t.entity == entity)
            .map(|t| t.rows)
            .unwrap_or(0)
    }
}

pub struct StatsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StatsRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn collect(&self) -> RepositoryResult<StoreStats> {
        let conn = self.get_conn()?;

        let schema_version = read_schema_version(&conn)?;
        if schema_version != Some(CURRENT_SCHEMA_VERSION) {
            warn!(
                found = ?schema_version,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version mismatch"
            );
        }

        let mut tables = Vec::with_capacity(EntityKind::ALL.len());
        for entity in EntityKind::ALL {
            let sql = format!("SELECT COUNT(*) FROM {}", entity.table_name());
            let rows: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            tables.push(TableCount { entity, rows });
        }

        Ok(StoreStats {
            schema_version,
            tables,
            operators_by_area: area_breakdown(&conn, "v_operator_full")?,
            notaries_by_area: area_breakdown(&conn, "v_notary_full")?,
        })
    }
}

fn area_breakdown(conn: &Connection, view: &'static str) -> RepositoryResult<AreaBreakdown> {
    let sql = format!(
        "SELECT area_type, COUNT(*) FROM {} GROUP BY area_type",
        view
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut breakdown = AreaBreakdown::default();
    for row in rows {
        let (area, count) = row?;
        match area.parse::<AreaType>() {
            Ok(AreaType::Urban) => breakdown.urban += count,
            Ok(AreaType::Rural) => breakdown.rural += count,
            Err(e) => warn!(view, error = %e, "unexpected area_type"),
        }
    }
    Ok(breakdown)
}
