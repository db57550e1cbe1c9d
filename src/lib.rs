// ==========================================
// Roster import - core library
// ==========================================
// Spreadsheet roster → normalized SQLite store
// Entity resolution + idempotent upsert, one sheet per entity
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain - entity catalogue and reports
pub mod domain;

// Repository - schema, lookups, upserts, statistics
pub mod repository;

// Importer - sources, coercion, converters, pipeline
pub mod importer;

// Configuration file
pub mod config;

// SQLite connection setup (PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

pub use config::{ConfigError, ImportConfig};
pub use domain::{ConversionReport, EntityKind, RunReport, SkipReason, UpsertAction};
pub use importer::{ImportError, ImportPipeline, ImportResult, SheetSource};
pub use repository::{RecordStore, RepositoryError, StatsRepository, StoreStats};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "roster-import";
