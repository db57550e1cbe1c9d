// ==========================================
// Roster import - geographic chain
// ==========================================
// Department ← Province ← Municipality ← ElectoralSeat ← PollingPlace
// Children are unique by name within their parent; polling places
// are unique within (electoral seat, name).
// ==========================================

use super::{identity, nullable, scoped_identity, ConversionContext, EntityConverter, RowOutcome};
use crate::domain::{ConversionReport, EntityKind, UpsertAction};
use crate::importer::error::ImportResult;
use crate::importer::row::SheetRow;
use crate::repository::{KeyRule, Record, RecordStore};
use tracing::{debug, warn};

// ==========================================
// Department - keyed by name
// ==========================================
pub struct DepartmentConverter;

impl EntityConverter for DepartmentConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Department
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        identity(row.optional_string(&ctx.columns.departments.name))
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.departments;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        let record = Record::new().with("name", name);
        let outcome = ctx
            .store
            .upsert(EntityKind::Department, &record, KeyRule::Single("name"))?;
        Ok(RowOutcome::written(outcome.action))
    }
}

// ==========================================
// Shared parent resolution
// ==========================================
// Walks (level, name) pairs from the top of the hierarchy down to the
// target level, the last pair. Each filled level is looked up inside
// the previous one; a blank level restarts the lookup unscoped. An
// unscoped name that matches several rows binds to the oldest one.
fn resolve_chain(
    store: &RecordStore,
    chain: &[(EntityKind, Option<String>)],
) -> ImportResult<Result<i64, RowOutcome>> {
    let mut scope: Option<i64> = None;
    for (position, (kind, value)) in chain.iter().enumerate() {
        let kind = *kind;
        let is_target = position + 1 == chain.len();
        let value = match value {
            Some(value) => value,
            None if is_target => return Ok(Err(RowOutcome::parent_not_found(kind, ""))),
            None => {
                scope = None;
                continue;
            }
        };

        let found = match scope {
            Some(parent_id) => {
                store.resolve_scoped(kind, parent_field(kind), parent_id, "name", value)?
            }
            None => {
                let ids = store.resolve_all(kind, "name", value)?;
                if ids.len() > 1 {
                    warn!(
                        entity = %kind,
                        name = %value,
                        matches = ids.len(),
                        "ambiguous name without a parent scope, using the first match"
                    );
                }
                ids.first().copied()
            }
        };
        match found {
            Some(id) if is_target => return Ok(Ok(id)),
            Some(id) => scope = Some(id),
            None => return Ok(Err(RowOutcome::parent_not_found(kind, value.clone()))),
        }
    }

    Ok(Err(RowOutcome::parent_not_found(
        chain.last().map(|(kind, _)| *kind).unwrap_or(EntityKind::Department),
        "",
    )))
}

// ==========================================
// Shared child-by-name conversion
// ==========================================
// Province / Municipality / ElectoralSeat: resolve the parent through
// its chain, upsert on (parent_id, name).
fn convert_named_child(
    store: &RecordStore,
    kind: EntityKind,
    parent_chain: &[(EntityKind, Option<String>)],
    name: String,
    extra: Record,
) -> ImportResult<RowOutcome> {
    let parent_id = match resolve_chain(store, parent_chain)? {
        Ok(id) => id,
        Err(outcome) => return Ok(outcome),
    };

    let mut record = Record::new()
        .with("name", name)
        .with(parent_field(kind), parent_id);
    for (field, value) in extra.fields() {
        record = record.with(*field, value.clone());
    }

    let key_fields: &'static [&'static str] = match kind {
        EntityKind::Province => &["department_id", "name"],
        EntityKind::Municipality => &["province_id", "name"],
        _ => &["municipality_id", "name"],
    };
    let outcome = store.upsert(kind, &record, KeyRule::Composite(key_fields))?;
    Ok(RowOutcome::written(outcome.action))
}

// ==========================================
// Province - (department, name), explicit urban flag
// ==========================================
pub struct ProvinceConverter;

impl EntityConverter for ProvinceConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Province
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        let cols = &ctx.columns.provinces;
        scoped_identity(
            row.optional_string(&cols.department),
            row.optional_string(&cols.name),
        )
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.provinces;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        let is_urban = row.coerce_bool(&cols.is_urban, false);
        convert_named_child(
            ctx.store,
            EntityKind::Province,
            &[(EntityKind::Department, row.optional_string(&cols.department))],
            name,
            Record::new().with("is_urban", is_urban),
        )
    }
}

// ==========================================
// Municipality - (province, name)
// ==========================================
pub struct MunicipalityConverter;

impl EntityConverter for MunicipalityConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::Municipality
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        let cols = &ctx.columns.municipalities;
        scoped_identity(
            row.optional_string(&cols.province),
            row.optional_string(&cols.name),
        )
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.municipalities;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        convert_named_child(
            ctx.store,
            EntityKind::Municipality,
            &[
                (EntityKind::Department, row.optional_string(&cols.department)),
                (EntityKind::Province, row.optional_string(&cols.province)),
            ],
            name,
            Record::new(),
        )
    }
}

// ==========================================
// ElectoralSeat - (municipality, name)
// ==========================================
pub struct ElectoralSeatConverter;

impl EntityConverter for ElectoralSeatConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::ElectoralSeat
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        let cols = &ctx.columns.electoral_seats;
        scoped_identity(
            row.optional_string(&cols.municipality),
            row.optional_string(&cols.name),
        )
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.electoral_seats;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        convert_named_child(
            ctx.store,
            EntityKind::ElectoralSeat,
            &[
                (EntityKind::Department, row.optional_string(&cols.department)),
                (EntityKind::Province, row.optional_string(&cols.province)),
                (EntityKind::Municipality, row.optional_string(&cols.municipality)),
            ],
            name,
            Record::new(),
        )
    }
}

// ==========================================
// PollingPlace - (electoral seat, name)
// ==========================================
// The seat is found by name, or through the department → province →
// municipality → seat chain when those columns are filled in. An
// existing place is matched on (resolved seat, name) only.
pub struct PollingPlaceConverter;

/// Foreign key linking a geographic level to its parent
fn parent_field(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Province => "department_id",
        EntityKind::Municipality => "province_id",
        EntityKind::ElectoralSeat => "municipality_id",
        _ => "electoral_seat_id",
    }
}

impl EntityConverter for PollingPlaceConverter {
    fn kind(&self) -> EntityKind {
        EntityKind::PollingPlace
    }

    fn identities(&self, ctx: &ConversionContext<'_>, row: &SheetRow) -> Vec<String> {
        let cols = &ctx.columns.polling_places;
        scoped_identity(
            row.optional_string(&cols.electoral_seat),
            row.optional_string(&cols.name),
        )
    }

    fn convert_row(
        &self,
        ctx: &ConversionContext<'_>,
        row: &SheetRow,
        _report: &mut ConversionReport,
    ) -> ImportResult<RowOutcome> {
        let cols = &ctx.columns.polling_places;
        let name = match row.optional_string(&cols.name) {
            Some(name) => name,
            None => return Ok(RowOutcome::blank(&cols.name)),
        };

        let chain = [
            (EntityKind::Department, row.optional_string(&cols.department)),
            (EntityKind::Province, row.optional_string(&cols.province)),
            (EntityKind::Municipality, row.optional_string(&cols.municipality)),
            (EntityKind::ElectoralSeat, row.optional_string(&cols.electoral_seat)),
        ];
        let seat_id = match resolve_chain(ctx.store, &chain)? {
            Ok(id) => id,
            Err(outcome) => return Ok(outcome),
        };

        let existing = ctx.store.resolve_scoped(
            EntityKind::PollingPlace,
            "electoral_seat_id",
            seat_id,
            "name",
            &name,
        )?;

        let details = Record::new()
            .with("address", nullable(row.optional_string(&cols.address)))
            .with("district", row.coerce_int(&cols.district, 0));

        match existing {
            Some(id) => {
                ctx.store
                    .update_record(EntityKind::PollingPlace, &details, id)?;
                debug!(id, name = %name, "polling place updated");
                Ok(RowOutcome::written(UpsertAction::Updated))
            }
            None => {
                let mut record = Record::new()
                    .with("name", name)
                    .with("electoral_seat_id", seat_id);
                for (field, value) in details.fields() {
                    record = record.with(*field, value.clone());
                }
                let id = ctx.store.insert_record(EntityKind::PollingPlace, &record)?;
                debug!(id, "polling place inserted");
                Ok(RowOutcome::written(UpsertAction::Inserted))
            }
        }
    }
}
