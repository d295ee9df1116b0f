//! Normalization of free-form notebook answers into library fields.
//!
//! A raw answer is cleaned of citation artifacts and its trailing reminder
//! footer, then mined for a bounded description and a list of slug-form
//! topics. Everything here is pure.

mod clean;
mod description;
mod topics;

use tracing::debug;

pub use clean::{FOOTER_SENTINEL, clean_answer};
pub use description::{MAX_DESCRIPTION_CHARS, extract_description};
pub use topics::{MAX_TOPICS, extract_topics, topic_slug};

/// Structured fields derived from one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedContent {
    pub description: String,
    pub topics: Vec<String>,
}

/// Clean `raw_answer` once and derive both fields from the cleaned text.
pub fn normalize(raw_answer: &str) -> NormalizedContent {
    let cleaned = clean_answer(raw_answer);
    let content = NormalizedContent {
        description: extract_description(&cleaned),
        topics: extract_topics(&cleaned),
    };
    debug!(
        raw_len = raw_answer.len(),
        description_len = content.description.len(),
        topics = content.topics.len(),
        "answer normalized"
    );
    content
}
