// ==========================================
// Roster import - tally sheets
// ==========================================
// A row binds one or more codes to a polling place. Invalid codes
// are dropped (and counted) without rejecting the row; a row left
// with no valid code is skipped.
// ==========================================

use super::{ConversionContext, EntityConverter, RowOutcome};
use crate::domain::{ConversionReport, EntityKind, SkipReason};
use crate::importer::code_list::{is_valid_code, split_codes};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row::SheetRow;
use crate::repository::{KeyRule, Record};
use tracing::{debug, error};

pub struct TallySheetConverter;

impl EntityConverter for TallySheetConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::TallySheet
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        split_codes(&row.coerce_string(&ctx.columns.tally_sheets.codes, ""))
            .into_iter()
            .filter(|code| is_valid_code(code))
            .collect()
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.tally_sheets;
        let cell = match row.optional_string(&cols.codes) {
            Some(cell) => cell,
            None => return Ok(RowOutcome::blank(&cols.codes)),
        };

        let (valid, invalid): (Vec<String>, Vec<String>) =
            split_codes(&cell).into_iter().partition(|code| is_valid_code(code));
        for code in &invalid {
            debug!(row = row.row_number, code = %code, "invalid tally code dropped");
            report.record_dropped(row.row_number, code);
        }
        if valid.is_empty() {
            return Ok(RowOutcome::Skipped(SkipReason::NoValidCodes { cell }));
        }

        let seat = row.coerce_string(&cols.electoral_seat, "");
        let place = row.coerce_string(&cols.polling_place, "");
        let place_id = match ctx.store.resolve_polling_place(&seat, &place)? {
            Some(id) => id,
            None => {
                return Ok(RowOutcome::parent_not_found(
                    EntityKind::PollingPlace,
                    format!("{} / {}", seat, place),
                ))
            }
        };

        // codes are independent records: a rejected code does not undo the others
        let mut actions = Vec::with_capacity(valid.len());
        for code in valid {
            let record = Record::new()
                .with("code", code.clone())
                .with("polling_place_id", place_id);
            match ctx
                .store
                .upsert(EntityKind::TallySheet, &record, KeyRule::Single("code"))
            {
                Ok(outcome) => actions.push(outcome.action),
                Err(e) if e.is_row_level() => {
                    error!(row = row.row_number, code = %code, error = %e, "tally code rejected");
                    report.record_error(row.row_number, format!("code '{}': {}", code, e));
                }
                Err(e) => return Err(ImportError::Repository(e)),
            }
        }

        Ok(RowOutcome::Written(actions))
    }
}
