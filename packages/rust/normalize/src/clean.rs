//! Cleanup pipeline for raw notebook answers.
//!
//! Each pass is a function `&str -> String` applied in sequence. Order
//! matters: bracketed citations go before bare digits so `[12]` is removed
//! whole instead of leaving `[]` behind.

use std::sync::LazyLock;

use regex::Regex;

/// Everything from this marker on is a follow-up reminder, not content.
pub const FOOTER_SENTINEL: &str = "EXTREMELY IMPORTANT:";

/// Run the full cleanup pipeline on a raw answer.
pub fn clean_answer(raw: &str) -> String {
    let mut result = strip_ellipsis_runs(raw);
    result = strip_bracket_citations(&result);
    result = strip_bare_citations(&result);
    result = strip_footer(&result);
    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Ellipsis runs
// ---------------------------------------------------------------------------

/// Remove collapsed citation runs such as `12...` or `3....`.
fn strip_ellipsis_runs(text: &str) -> String {
    static ELLIPSIS_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\d{1,3}\.{3,}").expect("valid regex"));

    ELLIPSIS_RUN_RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Bracketed citations
// ---------------------------------------------------------------------------

/// Remove `[n]` citation markers.
fn strip_bracket_citations(text: &str) -> String {
    static BRACKET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid regex"));

    BRACKET_RE.replace_all(text, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Bare citation numbers
// ---------------------------------------------------------------------------

/// Remove standalone one- or two-digit numbers.
///
/// Only maximal digit runs of length 1–2 go; `2024` or `123` survive intact.
fn strip_bare_citations(text: &str) -> String {
    static DIGIT_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

    DIGIT_RUN_RE
        .replace_all(text, |caps: &regex::Captures| {
            let run = &caps[0];
            if run.chars().count() <= 2 {
                String::new()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Footer
// ---------------------------------------------------------------------------

/// Drop the trailing reminder block.
fn strip_footer(text: &str) -> String {
    match text.find(FOOTER_SENTINEL) {
        Some(idx) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
