// ==========================================
// Roster import - source inspection
// ==========================================
// Read-only look at a source before importing: which configured
// sheets exist, their headers and row counts, and which configured
// columns they lack. Nothing is written to the store.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::EntityKind;
use crate::importer::error::ImportResult;
use crate::importer::sheet_source::SheetSource;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// One configured sheet as found in the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInspection {
    pub entity: EntityKind,
    pub sheet: String,
    pub present: bool,
    /// Non-blank data rows
    pub rows: usize,
    pub headers: Vec<String>,
    /// Configured columns the sheet needs but does not have
    pub missing_columns: Vec<String>,
    /// Scope columns the sheet does not have (lookups stay unscoped)
    pub missing_optional: Vec<String>,
}

impl SheetInspection {
    /// Present with every required column
    pub fn is_ready(&self) -> bool {
        self.present && self.missing_columns.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInspection {
    pub source: String,
    /// Every sheet the source offers, configured or not
    pub sheets: Vec<String>,
    pub entities: Vec<SheetInspection>,
}

impl SourceInspection {
    pub fn is_ready(&self) -> bool {
        self.entities.iter().all(SheetInspection::is_ready)
    }

    pub fn entity(&self, kind: EntityKind) -> Option<&SheetInspection> {
        self.entities.iter().find(|e| e.entity == kind)
    }
}

/// Inspect every configured sheet in dependency order
///
/// # Arguments
/// - source: any sheet source; only read
/// - config: sheet names and column mapping to check against
///
/// # Returns
/// - Ok(SourceInspection): a missing sheet is reported, not an error
/// - Err: the source itself could not be read
#[instrument(skip_all, fields(source = %source.describe()))]
pub fn inspect_source(
    source: &mut dyn SheetSource,
    config: &ImportConfig,
) -> ImportResult<SourceInspection> {
    let sheets = source.sheet_names()?;
    let mut entities = Vec::with_capacity(EntityKind::ALL.len());

    for kind in EntityKind::ALL {
        let sheet = config.sheets.name(kind).to_string();
        if !source.has_sheet(&sheet)? {
            warn!(entity = %kind, sheet = %sheet, "sheet missing");
            entities.push(SheetInspection {
                entity: kind,
                sheet,
                present: false,
                rows: 0,
                headers: Vec::new(),
                missing_columns: Vec::new(),
                missing_optional: Vec::new(),
            });
            continue;
        }

        let headers = source.sheet_headers(&sheet)?;
        let rows = source.read_sheet(&sheet)?.len();

        let mut missing_columns = Vec::new();
        let mut missing_optional = Vec::new();
        for (_, column, required) in config.columns.columns_for(kind) {
            if headers.iter().any(|h| h == column) {
                continue;
            }
            let bucket = if required {
                &mut missing_columns
            } else {
                &mut missing_optional
            };
            if !bucket.iter().any(|c: &String| c == column) {
                bucket.push(column.to_string());
            }
        }
        if !missing_columns.is_empty() {
            warn!(entity = %kind, sheet = %sheet, missing = ?missing_columns, "columns missing");
        }

        entities.push(SheetInspection {
            entity: kind,
            sheet,
            present: true,
            rows,
            headers,
            missing_columns,
            missing_optional,
        });
    }

    let inspection = SourceInspection {
        source: source.describe(),
        sheets,
        entities,
    };
    info!(ready = inspection.is_ready(), "source inspected");
    Ok(inspection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::row::SheetRow;
    use crate::importer::sheet_source::MemorySource;

    fn leaders() -> Vec<SheetRow> {
        vec![
            SheetRow::new(2)
                .with_cell("nombre", "Ana")
                .with_cell("cargo", "Jefa")
                .with_cell("celular", "700"),
            SheetRow::new(3).with_cell("nombre", "Luis"),
        ]
    }

    #[test]
    fn test_counts_rows_and_reports_missing_sheets() {
        let mut source = MemorySource::new()
            .with_sheet("Jefes", leaders())
            .with_sheet("Notas", vec![SheetRow::new(2).with_cell("x", "1")]);
        let config = ImportConfig::default();

        let inspection = inspect_source(&mut source, &config).unwrap();

        assert_eq!(inspection.entities.len(), EntityKind::ALL.len());
        assert_eq!(inspection.sheets, vec!["Jefes", "Notas"]);
        assert!(!inspection.is_ready());

        let leader = inspection.entity(EntityKind::Leader).unwrap();
        assert!(leader.is_ready());
        assert_eq!(leader.rows, 2);
        assert_eq!(leader.headers, vec!["cargo", "celular", "nombre"]);

        let accounts = inspection.entity(EntityKind::Account).unwrap();
        assert!(!accounts.present);
        assert_eq!(accounts.sheet, "Cuentas");
        assert_eq!(accounts.rows, 0);
    }

    #[test]
    fn test_missing_columns_split_required_and_scope() {
        let mut source = MemorySource::new().with_sheet(
            "Recintos",
            vec![SheetRow::new(2)
                .with_cell("asiento_electoral", "A")
                .with_cell("nombre", "Central")],
        );
        let config = ImportConfig::default();

        let inspection = inspect_source(&mut source, &config).unwrap();
        let places = inspection.entity(EntityKind::PollingPlace).unwrap();

        assert!(places.present);
        assert_eq!(places.rows, 1);
        assert_eq!(places.missing_columns, vec!["direccion", "distrito"]);
        assert_eq!(
            places.missing_optional,
            vec!["departamento", "provincia", "municipio"]
        );
        assert!(!places.is_ready());
    }

    #[test]
    fn test_follows_renamed_sheets_and_columns() {
        let mut config = ImportConfig::default();
        config.sheets.set(EntityKind::Leader, "Jefes 2025");
        config.columns.leaders.phone = "telefono".to_string();

        let mut source = MemorySource::new().with_sheet("Jefes 2025", leaders());
        let inspection = inspect_source(&mut source, &config).unwrap();

        let leader = inspection.entity(EntityKind::Leader).unwrap();
        assert_eq!(leader.sheet, "Jefes 2025");
        assert_eq!(leader.missing_columns, vec!["telefono"]);
    }
}
