// ==========================================
// Roster import - in-batch duplicate detection
// ==========================================
// Rows repeating an identity already seen earlier in the same sheet.
// They are still converted (the upsert makes the last one win);
// detection only feeds the `duplicates` counter and a warning.
// ==========================================

use crate::importer::row::SheetRow;
use std::collections::HashMap;

/// Later occurrences of repeated identities
///
/// # Arguments
/// - rows: sheet rows in source order
/// - identities: identity values of one row (blank identities must be omitted)
///
/// # Returns
/// - Vec<(row number, identity)>, excluding each identity's first occurrence
pub fn detect_duplicates<F>(rows: &[SheetRow], identities: F) -> Vec<(usize, String)>
where
    F: Fn(&SheetRow) -> Vec<String>,
{
    let mut first_occurrence: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for row in rows {
        for key in identities(row) {
            if first_occurrence.contains_key(&key) {
                duplicates.push((row.row_number, key));
            } else {
                first_occurrence.insert(key, row.row_number);
            }
        }
    }

    duplicates
}
