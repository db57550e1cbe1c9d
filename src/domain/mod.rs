// ==========================================
// Roster import - domain layer
// ==========================================

pub mod report;
pub mod types;

pub use report::{ConversionReport, IssueLevel, RowIssue, RunReport, RunTotals, SkipReason};
pub use types::{AreaType, EntityKind, UpsertAction};
