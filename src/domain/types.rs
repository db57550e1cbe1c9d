// ==========================================
// Roster import - domain types
// ==========================================
// Entity catalogue, dependency graph and area classification
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// EntityKind
// ==========================================
// One variant per imported sheet / persisted table.
// Declaration order is the canonical import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Leader,
    Coordinator,
    Group,
    Department,
    Province,
    Municipality,
    ElectoralSeat,
    PollingPlace,
    Operator,
    Notary,
    TallySheet,
    Account,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Leader,
        EntityKind::Coordinator,
        EntityKind::Group,
        EntityKind::Department,
        EntityKind::Province,
        EntityKind::Municipality,
        EntityKind::ElectoralSeat,
        EntityKind::PollingPlace,
        EntityKind::Operator,
        EntityKind::Notary,
        EntityKind::TallySheet,
        EntityKind::Account,
    ];

    /// snake_case name used in configuration keys and reports
    pub fn key(self) -> &'static str {
        match self {
            EntityKind::Leader => "leader",
            EntityKind::Coordinator => "coordinator",
            EntityKind::Group => "group",
            EntityKind::Department => "department",
            EntityKind::Province => "province",
            EntityKind::Municipality => "municipality",
            EntityKind::ElectoralSeat => "electoral_seat",
            EntityKind::PollingPlace => "polling_place",
            EntityKind::Operator => "operator",
            EntityKind::Notary => "notary",
            EntityKind::TallySheet => "tally_sheet",
            EntityKind::Account => "account",
        }
    }

    /// Physical table name
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Leader => "leader",
            EntityKind::Coordinator => "coordinator",
            EntityKind::Group => "work_group",
            EntityKind::Department => "department",
            EntityKind::Province => "province",
            EntityKind::Municipality => "municipality",
            EntityKind::ElectoralSeat => "electoral_seat",
            EntityKind::PollingPlace => "polling_place",
            EntityKind::Operator => "operator",
            EntityKind::Notary => "notary",
            EntityKind::TallySheet => "tally_sheet",
            EntityKind::Account => "account",
        }
    }

    /// Default worksheet name in the source spreadsheet
    pub fn default_sheet_name(self) -> &'static str {
        match self {
            EntityKind::Leader => "Jefes",
            EntityKind::Coordinator => "Coordinadores",
            EntityKind::Group => "Grupos",
            EntityKind::Department => "Departamentos",
            EntityKind::Province => "Provincias",
            EntityKind::Municipality => "Municipios",
            EntityKind::ElectoralSeat => "Asientos_Electorales",
            EntityKind::PollingPlace => "Recintos",
            EntityKind::Operator => "Operadores",
            EntityKind::Notary => "Notarios",
            EntityKind::TallySheet => "Actas",
            EntityKind::Account => "Cuentas",
        }
    }

    /// Entities whose rows must be persisted before this one can resolve its parents
    pub fn depends_on(self) -> &'static [EntityKind] {
        match self {
            EntityKind::Leader | EntityKind::Department => &[],
            EntityKind::Coordinator => &[EntityKind::Leader],
            EntityKind::Group => &[EntityKind::Coordinator],
            EntityKind::Province => &[EntityKind::Department],
            EntityKind::Municipality => &[EntityKind::Province],
            EntityKind::ElectoralSeat => &[EntityKind::Municipality],
            // the optional scoped chain also reads departments/provinces/municipalities
            EntityKind::PollingPlace => &[EntityKind::ElectoralSeat],
            EntityKind::Operator => &[EntityKind::Group, EntityKind::PollingPlace],
            EntityKind::Notary => &[EntityKind::PollingPlace],
            EntityKind::TallySheet => &[EntityKind::PollingPlace],
            EntityKind::Account => &[EntityKind::Operator],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| format!("unknown entity: {}", key))
    }
}

// ==========================================
// AreaType
// ==========================================
// Derived from the province-level `is_urban` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    Urban,
    Rural,
}

impl AreaType {
    pub fn from_urban_flag(is_urban: bool) -> Self {
        if is_urban {
            AreaType::Urban
        } else {
            AreaType::Rural
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaType::Urban => write!(f, "urban"),
            AreaType::Rural => write!(f, "rural"),
        }
    }
}

impl FromStr for AreaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urban" => Ok(AreaType::Urban),
            "rural" => Ok(AreaType::Rural),
            other => Err(format!("unknown area type: {}", other)),
        }
    }
}

// ==========================================
// UpsertAction
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Inserted,
    Updated,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertAction::Inserted => write!(f, "inserted"),
            UpsertAction::Updated => write!(f, "updated"),
        }
    }
}
