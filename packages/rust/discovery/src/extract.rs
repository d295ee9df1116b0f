//! Candidate rows from a snapshot of list-row texts.

use std::sync::LazyLock;

use regex::Regex;

/// Index/counter cells and collapsed-text placeholders.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+|\.\.\.)$").expect("placeholder regex"));

/// A list row with a usable title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub title: String,
    /// All cell texts in column order, including the title cell.
    pub cells: Vec<String>,
}

impl CandidateRow {
    /// Second column: source count as displayed.
    pub fn sources(&self) -> &str {
        self.cells.get(1).map(String::as_str).unwrap_or_default()
    }

    /// Third column: date as displayed.
    pub fn date(&self) -> &str {
        self.cells.get(2).map(String::as_str).unwrap_or_default()
    }
}

/// Pick a title for each row: the first cell longer than one character that
/// is not a bare number or `...`. Rows without one are dropped.
pub fn extract_rows(rows: &[Vec<String>]) -> Vec<CandidateRow> {
    rows.iter()
        .filter_map(|cells| {
            let title = cells.iter().map(|c| c.trim()).find(|c| is_title(c))?;
            Some(CandidateRow {
                title: title.to_string(),
                cells: cells.iter().map(|c| c.trim().to_string()).collect(),
            })
        })
        .collect()
}

fn is_title(text: &str) -> bool {
    text.chars().count() > 1 && !PLACEHOLDER_RE.is_match(text)
}
