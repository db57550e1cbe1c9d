// ==========================================
// Roster import - repository layer
// ==========================================
// Data access only, no import policy.
// All values are bound parameters.
// ==========================================

pub mod error;
pub mod record_store;
pub mod schema;
pub mod stats_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use record_store::{KeyRule, Record, RecordStore, UpsertOutcome};
pub use stats_repo::{AreaBreakdown, StatsRepository, StoreStats, TableCount};
