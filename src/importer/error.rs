// ==========================================
// Roster import - importer error types
// ==========================================
// SourceError: the spreadsheet side (file, sheet, cell decoding)
// ImportError: umbrella returned by the pipeline and the CLI
// ==========================================

use crate::config::ConfigError;
use crate::repository::RepositoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_SOURCE: i32 = 3;

// ==========================================
// SourceError
// ==========================================
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source not found: {0}")]
    NotFound(PathBuf),

    #[error("source unreadable ({path}): {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("unsupported source format: {0} (expected .xlsx/.xlsm/.xls/.ods or a CSV directory)")]
    UnsupportedFormat(String),

    #[error("sheet '{sheet}' not found in source")]
    SheetMissing { sheet: String },

    #[error("workbook parse failed: {0}")]
    Workbook(String),

    #[error("CSV parse failed: {0}")]
    Csv(String),
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::Workbook(err.to_string())
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        SourceError::Csv(err.to_string())
    }
}

// ==========================================
// ImportError
// ==========================================
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("source access error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 2 = configuration, 3 = source access, 1 = anything else
    pub fn exit_code(&self) -> i32 {
        match self {
            ImportError::Config(_) => EXIT_CONFIG,
            ImportError::Source(_) => EXIT_SOURCE,
            ImportError::Repository(_) | ImportError::Other(_) => EXIT_FAILURE,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        let config: ImportError = ConfigError::NotFound(PathBuf::from("x.toml")).into();
        assert_eq!(config.exit_code(), EXIT_CONFIG);

        let source: ImportError = SourceError::SheetMissing {
            sheet: "Recintos".to_string(),
        }
        .into();
        assert_eq!(source.exit_code(), EXIT_SOURCE);
        assert!(source.to_string().contains("Recintos"));

        let store: ImportError = RepositoryError::SchemaMissing {
            tables: vec!["leader".to_string()],
        }
        .into();
        assert_eq!(store.exit_code(), EXIT_FAILURE);
    }
}
