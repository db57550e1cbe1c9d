// ==========================================
// Roster import - conversion reports
// ==========================================
// Per-entity counters and the run-level aggregate.
// Every skip/error/drop is recorded so data loss stays observable.
// ==========================================

use crate::domain::types::{EntityKind, UpsertAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// SkipReason
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Identity column blank
    BlankIdentity { column: String },

    /// Required parent reference did not resolve
    ParentNotFound { parent: EntityKind, reference: String },

    /// Every code in a multi-code cell failed validation
    NoValidCodes { cell: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BlankIdentity { column } => {
                write!(f, "identity column '{}' is blank", column)
            }
            SkipReason::ParentNotFound { parent, reference } => {
                write!(f, "{} '{}' not found", parent, reference)
            }
            SkipReason::NoValidCodes { cell } => write!(f, "no valid code in '{}'", cell),
        }
    }
}

// ==========================================
// RowIssue
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Skipped,
    Error,
    Dropped,
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub level: IssueLevel,
    pub message: String,
}

// ==========================================
// ConversionReport - one converter, one sheet
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub entity: EntityKind,
    pub sheet: String,
    pub rows_read: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Items dropped inside an otherwise accepted row (invalid tally codes)
    pub dropped: usize,
    /// Rows repeating an identity already seen earlier in the same sheet
    pub duplicates: usize,
    pub issues: Vec<RowIssue>,
}

impl ConversionReport {
    pub fn new(entity: EntityKind, sheet: impl Into<String>) -> Self {
        Self {
            entity,
            sheet: sheet.into(),
            rows_read: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            dropped: 0,
            duplicates: 0,
            issues: Vec::new(),
        }
    }

    pub fn record_write(&mut self, action: UpsertAction) {
        match action {
            UpsertAction::Inserted => self.inserted += 1,
            UpsertAction::Updated => self.updated += 1,
        }
    }

    pub fn record_skip(&mut self, row_number: usize, reason: &SkipReason) {
        self.skipped += 1;
        self.push_issue(row_number, IssueLevel::Skipped, reason.to_string());
    }

    pub fn record_error(&mut self, row_number: usize, message: impl Into<String>) {
        self.errors += 1;
        self.push_issue(row_number, IssueLevel::Error, message.into());
    }

    pub fn record_dropped(&mut self, row_number: usize, item: &str) {
        self.dropped += 1;
        self.push_issue(row_number, IssueLevel::Dropped, format!("invalid code '{}'", item));
    }

    pub fn record_duplicate(&mut self, row_number: usize, key: &str) {
        self.duplicates += 1;
        self.push_issue(
            row_number,
            IssueLevel::Duplicate,
            format!("identity '{}' repeated in sheet, last row wins", key),
        );
    }

    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }

    fn push_issue(&mut self, row_number: usize, level: IssueLevel, message: String) {
        self.issues.push(RowIssue {
            row_number,
            level,
            message,
        });
    }
}

// ==========================================
// RunReport - whole pipeline
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub rows_read: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub dropped: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entities: Vec<ConversionReport>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            entities: Vec::new(),
        }
    }

    pub fn push(&mut self, report: ConversionReport) {
        self.entities.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn entity(&self, kind: EntityKind) -> Option<&ConversionReport> {
        self.entities.iter().find(|r| r.entity == kind)
    }

    pub fn totals(&self) -> RunTotals {
        self.entities.iter().fold(RunTotals::default(), |mut acc, r| {
            acc.rows_read += r.rows_read;
            acc.inserted += r.inserted;
            acc.updated += r.updated;
            acc.skipped += r.skipped;
            acc.errors += r.errors;
            acc.dropped += r.dropped;
            acc.duplicates += r.duplicates;
            acc
        })
    }
}
