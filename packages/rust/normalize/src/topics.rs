//! Topic extraction from bullet-style headers.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of topics kept per notebook.
pub const MAX_TOPICS: usize = 15;

/// Matches `• Label:`, `- **Label**:` and `* Label:` at the start of a line.
static BULLET_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[•\-*][ \t]+\*{0,2}(.+?)\*{0,2}[ \t]*:").expect("bullet header regex")
});

/// Extract slug-form topics from bullet headers in `cleaned`.
///
/// Labels must be 4–79 characters; slugs of two characters or fewer are
/// dropped. First occurrence wins and at most [`MAX_TOPICS`] are returned.
pub fn extract_topics(cleaned: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut topics = Vec::new();

    for caps in BULLET_HEADER_RE.captures_iter(cleaned) {
        let label = caps[1].trim().trim_matches('*').trim();
        let len = label.chars().count();
        if len <= 3 || len >= 80 {
            continue;
        }

        let slug = topic_slug(label);
        if slug.len() > 2 && seen.insert(slug.clone()) {
            topics.push(slug);
            if topics.len() == MAX_TOPICS {
                break;
            }
        }
    }

    topics
}

/// Convert a label to `[a-z0-9]+(-[a-z0-9]+)*` form.
pub fn topic_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.to_lowercase().chars() {
        let ch = if ch == ' ' || ch == '/' { '-' } else { ch };
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-') {
            continue;
        }
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug.trim_matches('-').to_string()
}
