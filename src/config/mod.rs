// ==========================================
// Roster import - configuration layer
// ==========================================
// TOML file → immutable ImportConfig handed to the pipeline
// ==========================================

pub mod columns;
pub mod import_config;

pub use columns::{
    AccountColumns, ColumnMapping, CoordinatorColumns, DepartmentColumns, ElectoralSeatColumns,
    GroupColumns, LeaderColumns, MunicipalityColumns, NotaryColumns, OperatorColumns,
    PersonColumns, PollingPlaceColumns, ProvinceColumns, TallySheetColumns,
};
pub use import_config::{
    ConfigError, ConfigResult, DatabaseConfig, ImportConfig, SheetNames, SourceConfig, SourceKind,
    DB_PATH_ENV, DEFAULT_CONFIG_FILE,
};
