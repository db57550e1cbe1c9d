// ==========================================
// Roster import - operator accounts
// ==========================================
// Keyed by username; one account per operator (enforced by the
// store). Passwords are stored as received.
// ==========================================

use super::{identity, ConversionContext, EntityConverter, RowOutcome};
use crate::domain::{ConversionReport, EntityKind};
use crate::importer::error::ImportResult;
use crate::importer::row::SheetRow;
use crate::repository::{KeyRule, Record};

pub struct AccountConverter;

impl EntityConverter for AccountConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Account
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.accounts.username))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.accounts;
        let username = match row.optional_string(&cols.username) {
            Some(username) => username,
            None => return Ok(RowOutcome::blank(&cols.username)),
        };

        let operator_ci = row.coerce_string(&cols.operator, "");
        let operator_id =
            match ctx
                .store
                .resolve(EntityKind::Operator, "national_id", &operator_ci)?
            {
                Some(id) => id,
                None => return Ok(RowOutcome::parent_not_found(EntityKind::Operator, operator_ci)),
            };

        let record = Record::new()
            .with("username", username)
            .with("password", row.coerce_string(&cols.password, ""))
            .with("operator_id", operator_id);

        let outcome = ctx
            .store
            .upsert(EntityKind::Account, &record, KeyRule::Single("username"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{
        run, scalar_i64, seed_geography, seed_organization, store,
    };
    use super::*;
    use crate::config::ColumnMapping;

    fn seed_operators(store: &crate::repository::RecordStore, columns: &ColumnMapping) {
        seed_geography(store, columns);
        seed_organization(store, columns);
        let operator = |row_number: usize, ci: &str| {
            SheetRow::new(row_number)
                .with_cell("grupo", "G1")
                .with_cell("asiento_electoral", "A")
                .with_cell("recinto", "Central")
                .with_cell("nombre", "Op")
                .with_cell("ci", ci)
        };
        run(
            store,
            columns,
            EntityKind::Operator,
            vec![operator(2, "1001"), operator(3, "1002")],
        );
    }

    fn account_row(row_number: usize, operator: &str, user: &str) -> SheetRow {
        SheetRow::new(row_number)
            .with_cell("operador", operator)
            .with_cell("user", user)
            .with_cell("password", "s3cret")
    }

    #[test]
    fn test_account_requires_operator() {
        let store = store();
        let columns = ColumnMapping::default();
        seed_operators(&store, &columns);

        let report = run(
            &store,
            &columns,
            EntityKind::Account,
            vec![account_row(2, "1001", "op1001"), account_row(3, "7777", "ghost")],
        );
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.issues[0].message, "operator '7777' not found");
    }

    #[test]
    fn test_second_account_for_operator_is_row_error() {
        let store = store();
        let columns = ColumnMapping::default();
        seed_operators(&store, &columns);

        let report = run(
            &store,
            &columns,
            EntityKind::Account,
            vec![
                account_row(2, "1001", "op1001"),
                account_row(3, "1001", "op1001-bis"),
                account_row(4, "1002", "op1002"),
            ],
        );
        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM account"), 2);
    }
}
