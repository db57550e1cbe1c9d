// ==========================================
// Roster import - field personnel
// ==========================================
// Operators and notaries, keyed by national id and bound to a
// polling place by (electoral seat, place name). Operators also
// belong to a work group.
// ==========================================

use super::{identity, nullable, ConversionContext, EntityConverter, RowOutcome};
use crate::config::PersonColumns;
use crate::domain::{ConversionReport, EntityKind};
use crate::importer::error::ImportResult;
use crate::importer::row::SheetRow;
use crate::repository::{KeyRule, Record, RecordStore};

fn person_record(row: &SheetRow, cols: &PersonColumns, national_id: String) -> Record {
    Record::new()
        .with("name", row.coerce_string(&cols.name, ""))
        .with("national_id", national_id)
        .with("issued_in", nullable(row.optional_string(&cols.issued_in)))
        .with("phone", nullable(row.optional_string(&cols.phone)))
        .with("email", nullable(row.optional_string(&cols.email)))
        .with("title", nullable(row.optional_string(&cols.title)))
}

/// Polling place id, or the skip outcome naming the unresolved pair
fn resolve_place(
    store: &RecordStore,
    row: &SheetRow,
    seat_column: &str,
    place_column: &str,
) -> ImportResult<Result<i64, RowOutcome>> {
    let seat = row.coerce_string(seat_column, "");
    let place = row.coerce_string(place_column, "");
    match store.resolve_polling_place(&seat, &place)? {
        Some(id) => Ok(Ok(id)),
        None => Ok(Err(RowOutcome::parent_not_found(
            EntityKind::PollingPlace,
            format!("{} / {}", seat, place),
        ))),
    }
}

// ==========================================
// Operator
// ==========================================
pub struct OperatorConverter;

impl EntityConverter for OperatorConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Operator
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.operators.person.national_id))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.operators;
        let national_id = match row.optional_string(&cols.person.national_id) {
            Some(id) => id,
            None => return Ok(RowOutcome::blank(&cols.person.national_id)),
        };

        let group_name = row.coerce_string(&cols.group, "");
        let group_id = match ctx.store.resolve(EntityKind::Group, "name", &group_name)? {
            Some(id) => id,
            None => return Ok(RowOutcome::parent_not_found(EntityKind::Group, group_name)),
        };

        let place_id =
            match resolve_place(ctx.store, row, &cols.electoral_seat, &cols.polling_place)? {
                Ok(id) => id,
                Err(skip) => return Ok(skip),
            };

        let record = person_record(row, &cols.person, national_id)
            .with("work_group_id", group_id)
            .with("polling_place_id", place_id);

        let outcome =
            ctx.store
                .upsert(EntityKind::Operator, &record, KeyRule::Single("national_id"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

// ==========================================
// Notary
// ==========================================
pub struct NotaryConverter;

impl EntityConverter for NotaryConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Notary
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.notaries.person.national_id))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.notaries;
        let national_id = match row.optional_string(&cols.person.national_id) {
            Some(id) => id,
            None => return Ok(RowOutcome::blank(&cols.person.national_id)),
        };

        let place_id =
            match resolve_place(ctx.store, row, &cols.electoral_seat, &cols.polling_place)? {
                Ok(id) => id,
                Err(skip) => return Ok(skip),
            };

        let record =
            person_record(row, &cols.person, national_id).with("polling_place_id", place_id);

        let outcome = ctx
            .store
            .upsert(EntityKind::Notary, &record, KeyRule::Single("national_id"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{
        run, scalar_i64, scalar_opt_text, seed_geography, seed_organization, store,
    };
    use super::*;
    use crate::config::ColumnMapping;

    fn operator_row(row_number: usize, ci: &str, seat: &str, group: &str) -> SheetRow {
        SheetRow::new(row_number)
            .with_cell("grupo", group)
            .with_cell("asiento_electoral", seat)
            .with_cell("recinto", "Central")
            .with_cell("nombre", "Pedro Mamani")
            .with_cell("ci", ci)
            .with_cell("celular", "76543210")
    }

    #[test]
    fn test_operator_binds_to_seat_specific_place() {
        let store = store();
        let columns = ColumnMapping::default();
        seed_geography(&store, &columns);
        seed_organization(&store, &columns);

        let report = run(
            &store,
            &columns,
            EntityKind::Operator,
            vec![operator_row(2, "555", "B", "G1")],
        );
        assert_eq!(report.inserted, 1);
        assert_eq!(
            scalar_opt_text(
                &store,
                "SELECT electoral_seat FROM v_operator_full WHERE national_id = '555'"
            ),
            Some("B".to_string())
        );
        assert_eq!(
            scalar_opt_text(
                &store,
                "SELECT area_type FROM v_operator_full WHERE national_id = '555'"
            ),
            Some("urban".to_string())
        );
    }

    #[test]
    fn test_operator_required_parents() {
        let store = store();
        let columns = ColumnMapping::default();
        seed_geography(&store, &columns);
        seed_organization(&store, &columns);

        let report = run(
            &store,
            &columns,
            EntityKind::Operator,
            vec![
                operator_row(2, "601", "B", "G-9"),
                operator_row(3, "602", "Z", "G1"),
                operator_row(4, "", "B", "G1"),
            ],
        );
        assert_eq!(report.skipped, 3);
        assert_eq!(report.issues[0].message, "work_group 'G-9' not found");
        assert_eq!(report.issues[1].message, "polling_place 'Z / Central' not found");
        assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM operator"), 0);
    }

    #[test]
    fn test_notary_moves_between_places() {
        let store = store();
        let columns = ColumnMapping::default();
        seed_geography(&store, &columns);

        let notary = |seat: &str| {
            SheetRow::new(2)
                .with_cell("asiento_electoral", seat)
                .with_cell("recinto", "Central")
                .with_cell("nombre", "Rosa")
                .with_cell("ci", "900")
        };
        run(&store, &columns, EntityKind::Notary, vec![notary("A")]);
        let report = run(&store, &columns, EntityKind::Notary, vec![notary("B")]);

        assert_eq!(report.updated, 1);
        assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM notary"), 1);
        assert_eq!(
            scalar_opt_text(&store, "SELECT electoral_seat FROM v_notary_full"),
            Some("B".to_string())
        );
    }
}
