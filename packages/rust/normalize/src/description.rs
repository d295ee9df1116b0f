//! Bounded description derived from the first paragraph.

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A sentence end at or past this index is a good enough cut point.
const MIN_SENTENCE_CUT: usize = 200;

const ELLIPSIS: &str = "...";

/// Take the first paragraph of `cleaned` and bound it to
/// [`MAX_DESCRIPTION_CHARS`].
///
/// Over-long paragraphs are cut after the last period in the first 500
/// characters when that period sits at index 200 or later; otherwise the
/// text is cut short enough that the appended `...` keeps the result
/// within the limit.
pub fn extract_description(cleaned: &str) -> String {
    let first = cleaned.split("\n\n").next().unwrap_or_default().trim();

    if first.chars().count() <= MAX_DESCRIPTION_CHARS {
        return first.to_string();
    }

    let window: Vec<char> = first.chars().take(MAX_DESCRIPTION_CHARS).collect();
    match window.iter().rposition(|&c| c == '.') {
        Some(pos) if pos >= MIN_SENTENCE_CUT => window[..=pos].iter().collect(),
        _ => {
            let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
            let mut desc: String = window[..keep].iter().collect();
            desc.push_str(ELLIPSIS);
            desc
        }
    }
}
