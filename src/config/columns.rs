// ==========================================
// Roster import - column mapping
// ==========================================
// {entity: {logical_field: source_column}}
// Defaults are the column headers of the source spreadsheet; every
// entry can be overridden from the config file without code changes.
// ==========================================

use crate::domain::EntityKind;
use serde::{Deserialize, Serialize};

/// (section, field) pairs that only narrow a parent lookup; sheets may omit them
const OPTIONAL_SCOPE_COLUMNS: [(&str, &str); 6] = [
    ("municipalities", "department"),
    ("electoral_seats", "department"),
    ("electoral_seats", "province"),
    ("polling_places", "department"),
    ("polling_places", "province"),
    ("polling_places", "municipality"),
];

fn col(name: &str) -> String {
    name.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderColumns {
    pub name: String,
    pub title: String,
    pub phone: String,
}

impl Default for LeaderColumns {
    fn default() -> Self {
        Self {
            name: col("nombre"),
            title: col("cargo"),
            phone: col("celular"),
        }
    }
}

/// Shared shape of coordinators, operators and notaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonColumns {
    pub name: String,
    pub national_id: String,
    pub issued_in: String,
    pub phone: String,
    pub email: String,
    pub title: String,
}

impl Default for PersonColumns {
    fn default() -> Self {
        Self {
            name: col("nombre"),
            national_id: col("ci"),
            issued_in: col("expedido"),
            phone: col("celular"),
            email: col("correo"),
            title: col("cargo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorColumns {
    /// Leader name
    pub leader: String,
    #[serde(flatten)]
    pub person: PersonColumns,
}

impl Default for CoordinatorColumns {
    fn default() -> Self {
        Self {
            leader: col("jefe"),
            person: PersonColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupColumns {
    /// Coordinator national id
    pub coordinator: String,
    pub name: String,
}

impl Default for GroupColumns {
    fn default() -> Self {
        Self {
            coordinator: col("coordinador_ci"),
            name: col("nombre"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentColumns {
    pub name: String,
}

impl Default for DepartmentColumns {
    fn default() -> Self {
        Self { name: col("nombre") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvinceColumns {
    pub department: String,
    pub name: String,
    pub is_urban: String,
}

impl Default for ProvinceColumns {
    fn default() -> Self {
        Self {
            department: col("departamento"),
            name: col("nombre"),
            is_urban: col("es_urbano"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MunicipalityColumns {
    /// Optional: narrows the province lookup when present
    pub department: String,
    pub province: String,
    pub name: String,
}

impl Default for MunicipalityColumns {
    fn default() -> Self {
        Self {
            department: col("departamento"),
            province: col("provincia"),
            name: col("nombre"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectoralSeatColumns {
    /// Optional: narrows the municipality lookup when present
    pub department: String,
    /// Optional: narrows the municipality lookup when present
    pub province: String,
    pub municipality: String,
    pub name: String,
}

impl Default for ElectoralSeatColumns {
    fn default() -> Self {
        Self {
            department: col("departamento"),
            province: col("provincia"),
            municipality: col("municipio"),
            name: col("nombre"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingPlaceColumns {
    /// Optional: narrows the seat lookup when present
    pub department: String,
    /// Optional: narrows the seat lookup when present
    pub province: String,
    /// Optional: narrows the seat lookup when present
    pub municipality: String,
    pub electoral_seat: String,
    pub name: String,
    pub address: String,
    pub district: String,
}

impl Default for PollingPlaceColumns {
    fn default() -> Self {
        Self {
            department: col("departamento"),
            province: col("provincia"),
            municipality: col("municipio"),
            electoral_seat: col("asiento_electoral"),
            name: col("nombre"),
            address: col("direccion"),
            district: col("distrito"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorColumns {
    pub group: String,
    pub electoral_seat: String,
    pub polling_place: String,
    #[serde(flatten)]
    pub person: PersonColumns,
}

impl Default for OperatorColumns {
    fn default() -> Self {
        Self {
            group: col("grupo"),
            electoral_seat: col("asiento_electoral"),
            polling_place: col("recinto"),
            person: PersonColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotaryColumns {
    pub electoral_seat: String,
    pub polling_place: String,
    #[serde(flatten)]
    pub person: PersonColumns,
}

impl Default for NotaryColumns {
    fn default() -> Self {
        Self {
            electoral_seat: col("asiento_electoral"),
            polling_place: col("recinto"),
            person: PersonColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallySheetColumns {
    pub electoral_seat: String,
    pub polling_place: String,
    /// One or more codes, delimited
    pub codes: String,
}

impl Default for TallySheetColumns {
    fn default() -> Self {
        Self {
            electoral_seat: col("asiento_electoral"),
            polling_place: col("recinto"),
            codes: col("codigos"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountColumns {
    /// Operator national id
    pub operator: String,
    pub username: String,
    pub password: String,
}

impl Default for AccountColumns {
    fn default() -> Self {
        Self {
            operator: col("operador"),
            username: col("user"),
            password: col("password"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub leaders: LeaderColumns,
    pub coordinators: CoordinatorColumns,
    pub groups: GroupColumns,
    pub departments: DepartmentColumns,
    pub provinces: ProvinceColumns,
    pub municipalities: MunicipalityColumns,
    pub electoral_seats: ElectoralSeatColumns,
    pub polling_places: PollingPlaceColumns,
    pub operators: OperatorColumns,
    pub notaries: NotaryColumns,
    pub tally_sheets: TallySheetColumns,
    pub accounts: AccountColumns,
}

impl ColumnMapping {
    /// (entity section, field, source column) for every configured column
    pub fn entries(&self) -> Vec<(&'static str, &'static str, &str)> {
        let mut out = vec![
            ("leaders", "name", self.leaders.name.as_str()),
            ("leaders", "title", self.leaders.title.as_str()),
            ("leaders", "phone", self.leaders.phone.as_str()),
            ("coordinators", "leader", self.coordinators.leader.as_str()),
            ("groups", "coordinator", self.groups.coordinator.as_str()),
            ("groups", "name", self.groups.name.as_str()),
            ("departments", "name", self.departments.name.as_str()),
            ("provinces", "department", self.provinces.department.as_str()),
            ("provinces", "name", self.provinces.name.as_str()),
            ("provinces", "is_urban", self.provinces.is_urban.as_str()),
            ("municipalities", "department", self.municipalities.department.as_str()),
            ("municipalities", "province", self.municipalities.province.as_str()),
            ("municipalities", "name", self.municipalities.name.as_str()),
            ("electoral_seats", "department", self.electoral_seats.department.as_str()),
            ("electoral_seats", "province", self.electoral_seats.province.as_str()),
            ("electoral_seats", "municipality", self.electoral_seats.municipality.as_str()),
            ("electoral_seats", "name", self.electoral_seats.name.as_str()),
            ("polling_places", "department", self.polling_places.department.as_str()),
            ("polling_places", "province", self.polling_places.province.as_str()),
            ("polling_places", "municipality", self.polling_places.municipality.as_str()),
            ("polling_places", "electoral_seat", self.polling_places.electoral_seat.as_str()),
            ("polling_places", "name", self.polling_places.name.as_str()),
            ("polling_places", "address", self.polling_places.address.as_str()),
            ("polling_places", "district", self.polling_places.district.as_str()),
            ("operators", "group", self.operators.group.as_str()),
            ("operators", "electoral_seat", self.operators.electoral_seat.as_str()),
            ("operators", "polling_place", self.operators.polling_place.as_str()),
            ("notaries", "electoral_seat", self.notaries.electoral_seat.as_str()),
            ("notaries", "polling_place", self.notaries.polling_place.as_str()),
            ("tally_sheets", "electoral_seat", self.tally_sheets.electoral_seat.as_str()),
            ("tally_sheets", "polling_place", self.tally_sheets.polling_place.as_str()),
            ("tally_sheets", "codes", self.tally_sheets.codes.as_str()),
            ("accounts", "operator", self.accounts.operator.as_str()),
            ("accounts", "username", self.accounts.username.as_str()),
            ("accounts", "password", self.accounts.password.as_str()),
        ];
        for (section, person) in [
            ("coordinators", &self.coordinators.person),
            ("operators", &self.operators.person),
            ("notaries", &self.notaries.person),
        ] {
            out.push((section, "name", person.name.as_str()));
            out.push((section, "national_id", person.national_id.as_str()));
            out.push((section, "issued_in", person.issued_in.as_str()));
            out.push((section, "phone", person.phone.as_str()));
            out.push((section, "email", person.email.as_str()));
            out.push((section, "title", person.title.as_str()));
        }
        out
    }

    /// Config section holding the columns of one entity
    pub fn section(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Leader => "leaders",
            EntityKind::Coordinator => "coordinators",
            EntityKind::Group => "groups",
            EntityKind::Department => "departments",
            EntityKind::Province => "provinces",
            EntityKind::Municipality => "municipalities",
            EntityKind::ElectoralSeat => "electoral_seats",
            EntityKind::PollingPlace => "polling_places",
            EntityKind::Operator => "operators",
            EntityKind::Notary => "notaries",
            EntityKind::TallySheet => "tally_sheets",
            EntityKind::Account => "accounts",
        }
    }

    /// (field, source column, required) for every column of one entity's sheet
    pub fn columns_for(&self, kind: EntityKind) -> Vec<(&'static str, &str, bool)> {
        let section = Self::section(kind);
        self.entries()
            .into_iter()
            .filter(|(s, _, _)| *s == section)
            .map(|(s, field, column)| {
                let optional = OPTIONAL_SCOPE_COLUMNS.contains(&(s, field));
                (field, column, !optional)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entity_has_columns() {
        let columns = ColumnMapping::default();
        for kind in EntityKind::ALL {
            assert!(!columns.columns_for(kind).is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_scope_columns_are_optional() {
        let columns = ColumnMapping::default();
        let required: Vec<&str> = columns
            .columns_for(EntityKind::PollingPlace)
            .into_iter()
            .filter(|(_, _, required)| *required)
            .map(|(_, column, _)| column)
            .collect();
        assert_eq!(
            required,
            vec!["asiento_electoral", "nombre", "direccion", "distrito"]
        );

        // the province sheet needs its department column
        assert!(columns
            .columns_for(EntityKind::Province)
            .iter()
            .all(|(_, _, required)| *required));
    }

    #[test]
    fn test_person_columns_belong_to_their_section() {
        let mut columns = ColumnMapping::default();
        columns.notaries.person.national_id = "documento".to_string();
        let notary: Vec<&str> = columns
            .columns_for(EntityKind::Notary)
            .into_iter()
            .map(|(_, column, _)| column)
            .collect();
        assert!(notary.contains(&"documento"));
        assert!(!columns
            .columns_for(EntityKind::Operator)
            .iter()
            .any(|(_, column, _)| *column == "documento"));
    }
}
