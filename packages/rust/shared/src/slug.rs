//! Slug derivation for library keys.

/// Fallback slug for titles that normalize to nothing.
const EMPTY_SLUG: &str = "notebook";

/// Derive the library key for a notebook title.
///
/// Lower-cases, turns whitespace runs into single hyphens, collapses
/// repeated hyphens and trims hyphens at both ends. Other characters are
/// kept as-is so existing keys stay stable.
pub fn slugify_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut last_hyphen = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '-' {
            if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        } else {
            slug.push(ch);
            last_hyphen = false;
        }
    }

    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}
