// ==========================================
// Roster import - organizational chain
// ==========================================
// Leader ← Coordinator ← Group
// ==========================================

use super::{identity, nullable, ConversionContext, EntityConverter, RowOutcome};
use crate::domain::{ConversionReport, EntityKind};
use crate::importer::error::ImportResult;
use crate::importer::row::SheetRow;
use crate::repository::{KeyRule, Record};

// ==========================================
// Leader - keyed by name
// ==========================================
pub struct LeaderConverter;

impl EntityConverter for LeaderConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Leader
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.leaders.name))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.leaders;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        let record = Record::new()
            .with("name", name)
            .with("title", nullable(row.optional_string(&cols.title)))
            .with("phone", nullable(row.optional_string(&cols.phone)));

        let outcome = ctx
            .store
            .upsert(EntityKind::Leader, &record, KeyRule::Single("name"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

// ==========================================
// Coordinator - keyed by national id, parent leader by name
// ==========================================
pub struct CoordinatorConverter;

impl EntityConverter for CoordinatorConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Coordinator
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.coordinators.person.national_id))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.coordinators;
        let national_id = match row.optional_string(&cols.person.national_id) {
            Some(id) => id,
            None => return Ok(RowOutcome::blank(&cols.person.national_id)),
        };

        let leader_name = row.coerce_string(&cols.leader, "");
        let leader_id = match ctx.store.resolve(EntityKind::Leader, "name", &leader_name)? {
            Some(id) => id,
            None => return Ok(RowOutcome::parent_not_found(EntityKind::Leader, leader_name)),
        };

        let p = &cols.person;
        let record = Record::new()
            .with("name", row.coerce_string(&p.name, ""))
            .with("national_id", national_id)
            .with("issued_in", nullable(row.optional_string(&p.issued_in)))
            .with("phone", nullable(row.optional_string(&p.phone)))
            .with("email", nullable(row.optional_string(&p.email)))
            .with("title", nullable(row.optional_string(&p.title)))
            .with("leader_id", leader_id);

        let outcome =
            ctx.store
                .upsert(EntityKind::Coordinator, &record, KeyRule::Single("national_id"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

// ==========================================
// Group - keyed by name, parent coordinator by national id
// ==========================================
pub struct GroupConverter;

impl EntityConverter for GroupConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Group
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.groups.name))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.groups;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        let coordinator_ci = row.coerce_string(&cols.coordinator, "");
        let coordinator_id =
            match ctx
                .store
                .resolve(EntityKind::Coordinator, "national_id", &coordinator_ci)?
            {
                Some(id) => id,
                None => {
                    return Ok(RowOutcome::parent_not_found(
                        EntityKind::Coordinator,
                        coordinator_ci,
                    ))
                }
            };

        let record = Record::new()
            .with("name", name)
            .with("coordinator_id", coordinator_id);

        let outcome = ctx
            .store
            .upsert(EntityKind::Group, &record, KeyRule::Single("name"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{run, scalar_i64, scalar_opt_text, store};
    use super::*;
    use crate::config::ColumnMapping;

    #[test]
    fn test_leader_update_in_place() {
        let store = store();
        let columns = ColumnMapping::default();
        let first = run(
            &store,
            &columns,
            EntityKind::Leader,
            vec![SheetRow::new(2)
                .with_cell("nombre", "Ana")
                .with_cell("celular", "700")],
        );
        assert_eq!(first.inserted, 1);

        let second = run(
            &store,
            &columns,
            EntityKind::Leader,
            vec![SheetRow::new(2)
                .with_cell("nombre", "Ana")
                .with_cell("celular", "711")],
        );
        assert_eq!(second.updated, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM leader"), 1);
        assert_eq!(
            scalar_opt_text(&store, "SELECT phone FROM leader WHERE name = 'Ana'"),
            Some("711".to_string())
        );
        // blank optional text is stored as NULL
        assert_eq!(
            scalar_opt_text(&store, "SELECT title FROM leader WHERE name = 'Ana'"),
            None
        );
    }

    #[test]
    fn test_blank_identity_is_skipped() {
        let store = store();
        let columns = ColumnMapping::default();
        let report = run(
            &store,
            &columns,
            EntityKind::Leader,
            vec![SheetRow::new(2)
                .with_cell("nombre", "  ")
                .with_cell("celular", "700")],
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(report.written(), 0);
    }

    #[test]
    fn test_coordinator_requires_leader() {
        let store = store();
        let columns = ColumnMapping::default();
        let report = run(
            &store,
            &columns,
            EntityKind::Coordinator,
            vec![SheetRow::new(2)
                .with_cell("jefe", "Nadie")
                .with_cell("nombre", "Carla")
                .with_cell("ci", "100")],
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(report.issues[0].row_number, 2);
        assert_eq!(report.issues[0].message, "leader 'Nadie' not found");
        assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM coordinator"), 0);
    }

    #[test]
    fn test_group_resolves_numeric_national_id() {
        let store = store();
        let columns = ColumnMapping::default();
        run(
            &store,
            &columns,
            EntityKind::Leader,
            vec![SheetRow::new(2).with_cell("nombre", "Ana")],
        );
        run(
            &store,
            &columns,
            EntityKind::Coordinator,
            vec![SheetRow::new(2)
                .with_cell("jefe", "Ana")
                .with_cell("nombre", "Carla")
                .with_cell("ci", 4_567_890.0)],
        );
        let report = run(
            &store,
            &columns,
            EntityKind::Group,
            vec![
                SheetRow::new(2)
                    .with_cell("coordinador_ci", "4567890")
                    .with_cell("nombre", "G1"),
                SheetRow::new(3)
                    .with_cell("coordinador_ci", "999")
                    .with_cell("nombre", "G2"),
            ],
        );
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
    }
}
