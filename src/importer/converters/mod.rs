// ==========================================
// Roster import - entity converters
// ==========================================
// One converter per entity. Common shape per row:
//   blank identity → skip
//   coerce → resolve parents (required unresolved → skip)
//   persist via upsert → tally
// Row-level store errors are counted and the batch continues;
// everything else aborts the run.
// ==========================================

pub mod account;
pub mod geo;
pub mod org;
pub mod people;
pub mod tally;

use crate::config::ColumnMapping;
use crate::domain::{ConversionReport, EntityKind, SkipReason, UpsertAction};
use crate::importer::duplicates::detect_duplicates;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row::SheetRow;
use crate::repository::RecordStore;
use rusqlite::types::Value;
use tracing::{error, info, instrument, warn};

pub use account::AccountConverter;
pub use geo::{
    DepartmentConverter, ElectoralSeatConverter, MunicipalityConverter, PollingPlaceConverter,
    ProvinceConverter,
};
pub use org::{CoordinatorConverter, GroupConverter, LeaderConverter};
pub use people::{NotaryConverter, OperatorConverter};
pub use tally::TallySheetConverter;

/// Store handle + column mapping shared by every converter of a run
pub struct ConversionContext<'a> {
    pub store: &'a RecordStore,
    pub columns: &'a ColumnMapping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// One action per persisted record (tally rows may persist several)
    Written(Vec<UpsertAction>),
    Skipped(SkipReason),
}

impl RowOutcome {
    pub fn written(action: UpsertAction) -> Self {
        RowOutcome::Written(vec![action])
    }

    pub fn blank(column: &str) -> Self {
        RowOutcome::Skipped(SkipReason::BlankIdentity {
            column: column.to_string(),
        })
    }

    pub fn parent_not_found(parent: EntityKind, reference: impl Into<String>) -> Self {
        RowOutcome::Skipped(SkipReason::ParentNotFound {
            parent,
            reference: reference.into(),
        })
    }
}

pub trait EntityConverter {
    fn kind(&self) -> EntityKind;

    /// Identity values of a row, used for in-batch duplicate detection
    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String>;

    /// Convert and persist one row
    ///
    /// Converters that drop items inside an accepted row record them on `report`.
    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome>;

    /// Convert a whole sheet
    ///
    /// # Errors
    /// Only run-level failures (lost connection, lock poisoning, ...).
    #[instrument(skip_all, fields(entity = %self.kind(), sheet = sheet))]
    fn convert(
        &self,
        ctx: &ConversionContext<'_>,
        sheet: &str,
        rows: &[SheetRow],
    ) -> ImportResult<ConversionReport> {
        let kind = self.kind();
        let mut report = ConversionReport::new(kind, sheet);
        report.rows_read = rows.len();

        for (row_number, key) in detect_duplicates(rows, |row| self.identities(ctx, row)) {
            warn!(entity = %kind, row = row_number, key = %key, "duplicate identity in sheet");
            report.record_duplicate(row_number, &key);
        }

        for row in rows {
            match self.convert_row(ctx, row, &mut report) {
                Ok(RowOutcome::Written(actions)) => {
                    for action in actions {
                        report.record_write(action);
                    }
                }
                Ok(RowOutcome::Skipped(reason)) => {
                    warn!(entity = %kind, row = row.row_number, %reason, "row skipped");
                    report.record_skip(row.row_number, &reason);
                }
                Err(ImportError::Repository(e)) if e.is_row_level() => {
                    error!(entity = %kind, row = row.row_number, error = %e, "row rejected by store");
                    report.record_error(row.row_number, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            entity = %kind,
            rows = report.rows_read,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            dropped = report.dropped,
            duplicates = report.duplicates,
            "sheet converted"
        );
        Ok(report)
    }
}

/// Converter for an entity kind
pub fn converter_for(kind: EntityKind) -> Box<dyn EntityConverter> {
    match kind {
        EntityKind::Leader => Box::new(LeaderConverter),
        EntityKind::Coordinator => Box::new(CoordinatorConverter),
        EntityKind::Group => Box::new(GroupConverter),
        EntityKind::Department => Box::new(DepartmentConverter),
        EntityKind::Province => Box::new(ProvinceConverter),
        EntityKind::Municipality => Box::new(MunicipalityConverter),
        EntityKind::ElectoralSeat => Box::new(ElectoralSeatConverter),
        EntityKind::PollingPlace => Box::new(PollingPlaceConverter),
        EntityKind::Operator => Box::new(OperatorConverter),
        EntityKind::Notary => Box::new(NotaryConverter),
        EntityKind::TallySheet => Box::new(TallySheetConverter),
        EntityKind::Account => Box::new(AccountConverter),
    }
}

/// Blank optional text is stored as NULL
pub(crate) fn nullable(value: Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text),
        None => Value::Null,
    }
}

/// Identity list with blank values omitted
pub(crate) fn identity(value: Option<String>) -> Vec<String> {
    value.into_iter().collect()
}

/// "<parent> / <name>" identity of a child unique within its parent
pub(crate) fn scoped_identity(parent: Option<String>, name: Option<String>) -> Vec<String> {
    match (parent, name) {
        (Some(parent), Some(name)) => vec![format!("{} / {}", parent, name)],
        _ => Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn store() -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        store.build_schema().unwrap();
        store
    }

    pub fn run(
        store: &RecordStore,
        columns: &ColumnMapping,
        kind: EntityKind,
        rows: Vec<SheetRow>,
    ) -> ConversionReport {
        let ctx = ConversionContext { store, columns };
        converter_for(kind)
            .convert(&ctx, kind.default_sheet_name(), &rows)
            .unwrap()
    }

    /// Department "La Paz" → province "Murillo" (urban) → municipality "El Alto"
    /// → seats "A" and "B", each with a polling place named "Central"
    pub fn seed_geography(store: &RecordStore, columns: &ColumnMapping) {
        run(
            store,
            columns,
            EntityKind::Department,
            vec![SheetRow::new(2).with_cell("nombre", "La Paz")],
        );
        run(
            store,
            columns,
            EntityKind::Province,
            vec![SheetRow::new(2)
                .with_cell("departamento", "La Paz")
                .with_cell("nombre", "Murillo")
                .with_cell("es_urbano", "si")],
        );
        run(
            store,
            columns,
            EntityKind::Municipality,
            vec![SheetRow::new(2)
                .with_cell("provincia", "Murillo")
                .with_cell("nombre", "El Alto")],
        );
        run(
            store,
            columns,
            EntityKind::ElectoralSeat,
            vec![
                SheetRow::new(2)
                    .with_cell("municipio", "El Alto")
                    .with_cell("nombre", "A"),
                SheetRow::new(3)
                    .with_cell("municipio", "El Alto")
                    .with_cell("nombre", "B"),
            ],
        );
        run(
            store,
            columns,
            EntityKind::PollingPlace,
            vec![
                SheetRow::new(2)
                    .with_cell("asiento_electoral", "A")
                    .with_cell("nombre", "Central")
                    .with_cell("direccion", "Av. 6 de Marzo"),
                SheetRow::new(3)
                    .with_cell("asiento_electoral", "B")
                    .with_cell("nombre", "Central")
                    .with_cell("distrito", 4_i64),
            ],
        );
    }

    /// Leader "Ana" → coordinator 100 → group "G1"
    pub fn seed_organization(store: &RecordStore, columns: &ColumnMapping) {
        run(
            store,
            columns,
            EntityKind::Leader,
            vec![SheetRow::new(2).with_cell("nombre", "Ana")],
        );
        run(
            store,
            columns,
            EntityKind::Coordinator,
            vec![SheetRow::new(2)
                .with_cell("jefe", "Ana")
                .with_cell("nombre", "Carla")
                .with_cell("ci", "100")],
        );
        run(
            store,
            columns,
            EntityKind::Group,
            vec![SheetRow::new(2)
                .with_cell("coordinador_ci", 100_i64)
                .with_cell("nombre", "G1")],
        );
    }

    pub fn scalar_i64(store: &RecordStore, sql: &str) -> i64 {
        let conn = store.connection();
        let conn = conn.lock().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn scalar_opt_text(store: &RecordStore, sql: &str) -> Option<String> {
        let conn = store.connection();
        let conn = conn.lock().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}
