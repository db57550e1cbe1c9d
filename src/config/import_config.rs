// ==========================================
// Roster import - configuration
// ==========================================
// Immutable configuration injected into the pipeline:
// database path, source location, sheet names, column mapping.
// Loaded from TOML; everything has a default.
// ==========================================

use crate::config::columns::ColumnMapping;
use crate::domain::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "roster_import.toml";

/// Environment override for the database path
pub const DB_PATH_ENV: &str = "ROSTER_IMPORT_DB_PATH";

// ==========================================
// ConfigError
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("configuration file unreadable ({path}): {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("configuration file malformed ({path}): {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration value ({key}): {message}")]
    Invalid { key: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// Sections
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database/roster.db"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// .xlsx / .xlsm / .xls / .ods, one worksheet per sheet name
    Workbook,
    /// Directory holding `<sheet name>.csv` files
    CsvDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Workbook,
            path: PathBuf::from("data/roster.xlsx"),
        }
    }
}

/// Sheet name overrides; entities not listed use their default sheet name
///
/// Keyed by entity (`polling_place = "Recintos"`); unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct SheetNames(BTreeMap<EntityKind, String>);

impl TryFrom<BTreeMap<String, String>> for SheetNames {
    type Error = String;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut names = BTreeMap::new();
        for (key, sheet) in raw {
            names.insert(key.parse::<EntityKind>()?, sheet);
        }
        Ok(Self(names))
    }
}

impl From<SheetNames> for BTreeMap<String, String> {
    fn from(names: SheetNames) -> Self {
        names
            .0
            .into_iter()
            .map(|(kind, sheet)| (kind.key().to_string(), sheet))
            .collect()
    }
}

impl SheetNames {
    pub fn name(&self, kind: EntityKind) -> &str {
        self.0
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_sheet_name())
    }

    pub fn set(&mut self, kind: EntityKind, name: impl Into<String>) {
        self.0.insert(kind, name.into());
    }
}

// ==========================================
// ImportConfig
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub sheets: SheetNames,
    pub columns: ColumnMapping,
}

impl ImportConfig {
    /// Pick the config file to load
    ///
    /// # Lookup order
    /// 1. explicit path (returned as-is, `load` reports it if missing)
    /// 2. `./roster_import.toml`
    /// 3. `<user config dir>/roster-import/config.toml`
    pub fn locate(explicit: Option<&Path>) -> ConfigResult<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("roster-import").join("config.toml");
            if user.exists() {
                return Ok(user);
            }
        }

        Err(ConfigError::NotFound(local))
    }

    /// Load, apply environment overrides, resolve relative paths, validate
    ///
    /// Relative `database.path` / `source.path` are resolved against the
    /// directory containing the config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config: ImportConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        config.apply_env_overrides();
        config.validate()?;

        info!(
            config = %path.display(),
            database = %config.database.path.display(),
            source = %config.source.path.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse from TOML text (no path resolution, no env overrides)
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ImportConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        if self.database.path.is_relative() {
            self.database.path = base.join(&self.database.path);
        }
        if self.source.path.is_relative() {
            self.source.path = base.join(&self.source.path);
        }
    }

    /// Load the located file, or fall back to environment-aware defaults
    ///
    /// # Arguments
    /// - located: result of `locate`
    /// - require_file: commands that read the source need a real file
    pub fn load_or_defaults(located: ConfigResult<PathBuf>, require_file: bool) -> ConfigResult<Self> {
        match located {
            Ok(path) => Self::load(&path),
            Err(ConfigError::NotFound(path)) if !require_file => {
                info!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::from_env_defaults())
            }
            Err(e) => Err(e),
        }
    }

    /// Defaults with the environment overrides applied (no config file found)
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply `ROSTER_IMPORT_DB_PATH` when it is set and not blank
    pub fn apply_env_overrides(&mut self) {
        self.override_db_path(std::env::var(DB_PATH_ENV).ok().as_deref());
    }

    fn override_db_path(&mut self, value: Option<&str>) {
        if let Some(path) = value.map(str::trim).filter(|p| !p.is_empty()) {
            debug!(env = DB_PATH_ENV, path, "database path overridden");
            self.database.path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database.path".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        for kind in EntityKind::ALL {
            if self.sheets.name(kind).trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: format!("sheets.{}", kind.key()),
                    message: "sheet name must not be empty".to_string(),
                });
            }
        }

        for (section, field, column) in self.columns.entries() {
            if column.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: format!("columns.{}.{}", section, field),
                    message: "column name must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
