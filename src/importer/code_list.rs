// ==========================================
// Roster import - tally sheet code lists
// ==========================================
// One cell may hold several codes. Delimiters are tried in priority
// order; the first one that yields more than one token wins and the
// tokens are split again by the remaining, lower-priority delimiters.
// ==========================================

/// Comma, semicolon, pipe, tab, space (highest priority first)
const DELIMITERS: [char; 5] = [',', ';', '|', '\t', ' '];

const FORBIDDEN: [char; 8] = ['<', '>', '"', '\'', '\\', '/', '?', '*'];

const MIN_CODE_LEN: usize = 3;
const MAX_CODE_LEN: usize = 50;

/// Split a cell into codes, in source order
///
/// # Example
/// ```
/// use roster_import::importer::code_list::split_codes;
/// assert_eq!(split_codes("AB123, CD456;EF789"), vec!["AB123", "CD456", "EF789"]);
/// ```
pub fn split_codes(cell: &str) -> Vec<String> {
    split_with(cell, &DELIMITERS)
}

fn split_with(text: &str, delimiters: &[char]) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    for (idx, delimiter) in delimiters.iter().enumerate() {
        let tokens: Vec<&str> = text
            .split(*delimiter)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.len() > 1 {
            let rest = &delimiters[idx + 1..];
            return tokens
                .into_iter()
                .flat_map(|token| split_with(token, rest))
                .collect();
        }
    }

    vec![text.to_string()]
}

/// 3..=50 characters after trimming, at least one alphanumeric, no markup/path characters
pub fn is_valid_code(code: &str) -> bool {
    let code = code.trim();
    let len = code.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return false;
    }
    if !code.chars().any(char::is_alphanumeric) {
        return false;
    }
    !code.chars().any(|c| FORBIDDEN.contains(&c))
}
