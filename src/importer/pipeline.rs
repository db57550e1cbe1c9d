// ==========================================
// Roster import - pipeline orchestrator
// ==========================================
// schema check → sheet preflight → converters in dependency order
// One converter finishes before the next starts; every statement
// commits on its own, so an aborted run leaves consistent partial data.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{EntityKind, RunReport};
use crate::importer::converters::{converter_for, ConversionContext};
use crate::importer::error::{ImportError, ImportResult, SourceError};
use crate::importer::sheet_source::SheetSource;
use crate::repository::RecordStore;
use tracing::{error, info, instrument};

/// Stable topological order: among ready entities the earliest in `kinds` goes first
///
/// Dependencies outside `kinds` are treated as already satisfied.
pub fn execution_order(kinds: &[EntityKind]) -> ImportResult<Vec<EntityKind>> {
    let mut pending: Vec<EntityKind> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !pending.contains(kind) {
            pending.push(*kind);
        }
    }

    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|kind| {
            kind.depends_on()
                .iter()
                .all(|parent| !pending.contains(parent))
        });
        match ready {
            Some(idx) => ordered.push(pending.remove(idx)),
            None => {
                return Err(ImportError::Other(anyhow::anyhow!(
                    "dependency cycle among: {:?}",
                    pending
                )))
            }
        }
    }
    Ok(ordered)
}

pub struct ImportPipeline<'a> {
    store: &'a RecordStore,
    config: &'a ImportConfig,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(store: &'a RecordStore, config: &'a ImportConfig) -> Self {
        Self { store, config }
    }

    /// Every configured sheet must exist before anything is written
    pub fn preflight(&self, source: &dyn SheetSource) -> ImportResult<()> {
        let mut missing = Vec::new();
        for kind in EntityKind::ALL {
            let sheet = self.config.sheets.name(kind);
            if !source.has_sheet(sheet)? {
                missing.push(sheet.to_string());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            error!(source = %source.describe(), missing = ?missing, "sheets missing from source");
            Err(SourceError::SheetMissing {
                sheet: missing.join(", "),
            }
            .into())
        }
    }

    /// Import every entity; skipped rows never fail the run
    #[instrument(skip_all, fields(source = %source.describe()))]
    pub fn run(&self, source: &mut dyn SheetSource) -> ImportResult<RunReport> {
        self.store.ensure_schema()?;
        self.preflight(&*source)?;

        let mut report = RunReport::start();
        info!(run_id = %report.run_id, "import started");

        let ctx = ConversionContext {
            store: self.store,
            columns: &self.config.columns,
        };

        for kind in execution_order(&EntityKind::ALL)? {
            let sheet = self.config.sheets.name(kind);
            let rows = source.read_sheet(sheet)?;
            let converter = converter_for(kind);
            report.push(converter.convert(&ctx, sheet, &rows)?);
        }

        report.finish();
        let totals = report.totals();
        info!(
            run_id = %report.run_id,
            rows = totals.rows_read,
            inserted = totals.inserted,
            updated = totals.updated,
            skipped = totals.skipped,
            errors = totals.errors,
            dropped = totals.dropped,
            duplicates = totals.duplicates,
            "import finished"
        );
        Ok(report)
    }
}
