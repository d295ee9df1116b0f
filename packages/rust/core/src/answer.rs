//! Asking a notebook a question through its chat panel.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use nbshelf_discovery::{Clock, ENTER_KEY, ElementHandle, PageDriver, RetryPolicy, WaitUntil};
use nbshelf_shared::{EnrichConfig, NbshelfError, Result};

/// Produces a raw natural-language answer for a notebook.
#[async_trait]
pub trait QuestionAnswerer: Send {
    /// Ask `question` of the notebook at `url`. An empty answer means the
    /// notebook did not respond in time.
    async fn ask(&mut self, question: &str, url: &str) -> Result<String>;
}

/// Chat input, in order of preference. The aria labels cover the German and
/// English UI.
pub const QUERY_INPUT_SELECTORS: &[&str] = &[
    "textarea.query-box-input",
    r#"textarea[aria-label="Feld für Anfragen"]"#,
    r#"textarea[aria-label="Input for queries"]"#,
];

/// Assistant message containers, in order of preference.
pub const RESPONSE_SELECTORS: &[&str] = &[
    ".to-user-container .message-text-content",
    "[data-message-author='bot']",
    "[data-message-author='assistant']",
];

/// Identical reads in a row before a streamed answer counts as finished.
const STABLE_READS: u32 = 3;

const RESPONSE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The chat input can take a while to appear on a cold notebook.
const INPUT_POLICY: RetryPolicy = RetryPolicy {
    interval: Duration::from_secs(1),
    max_attempts: 30,
};

/// Texts of every element matched by the first selector in `arguments[0]`
/// that matches anything.
const RESPONSE_TEXTS_JS: &str = r#"
const selectors = arguments[0];
for (const sel of selectors) {
    const nodes = document.querySelectorAll(sel);
    if (nodes.length > 0) {
        return Array.from(nodes).map(n => (n.innerText || n.textContent || '').trim());
    }
}
return [];
"#;

/// [`QuestionAnswerer`] driving the notebook page in the current session.
pub struct BrowserAnswerer<'a, D: PageDriver> {
    driver: &'a mut D,
    clock: &'a dyn Clock,
    config: &'a EnrichConfig,
}

impl<'a, D: PageDriver> BrowserAnswerer<'a, D> {
    pub fn new(driver: &'a mut D, clock: &'a dyn Clock, config: &'a EnrichConfig) -> Self {
        Self {
            driver,
            clock,
            config,
        }
    }

    async fn find_input(&mut self) -> Option<ElementHandle> {
        let mut attempts = INPUT_POLICY.attempts(self.clock);
        while let Some(attempt) = attempts.tick().await {
            for selector in QUERY_INPUT_SELECTORS {
                if let Ok(Some(element)) = self.driver.query(selector).await {
                    debug!(attempt, selector, "chat input found");
                    return Some(element);
                }
            }
        }
        None
    }

    async fn response_texts(&mut self) -> Vec<String> {
        let selectors = json!(RESPONSE_SELECTORS);
        match self.driver.evaluate(RESPONSE_TEXTS_JS, vec![selectors]).await {
            Ok(value) => decode_texts(value),
            Err(e) => {
                debug!(error = %e, "reading responses failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<D: PageDriver> QuestionAnswerer for BrowserAnswerer<'_, D> {
    #[instrument(skip(self, question))]
    async fn ask(&mut self, question: &str, url: &str) -> Result<String> {
        self.driver
            .goto(url, WaitUntil::DomContentLoaded, self.config.page_load_timeout)
            .await?;

        let input = self
            .find_input()
            .await
            .ok_or_else(|| NbshelfError::Enrichment(format!("{url}: chat input not found")))?;

        let baseline = self.response_texts().await.len();

        self.driver.click(&input).await?;
        self.driver
            .type_text(&input, &format!("{question}{ENTER_KEY}"))
            .await?;
        debug!(baseline, "question submitted");

        let mut attempts = RetryPolicy::new(
            RESPONSE_POLL_INTERVAL,
            response_attempts(self.config.answer_timeout),
        )
        .attempts(self.clock);
        let mut previous = String::new();
        let mut streak = 0u32;

        while let Some(attempt) = attempts.tick().await {
            let current = latest_reply(&self.response_texts().await, baseline);
            streak = next_streak(&previous, &current, streak);
            if streak >= STABLE_READS {
                debug!(attempt, chars = current.len(), "answer settled");
                return Ok(current);
            }
            previous = current;
        }

        warn!(timeout = ?self.config.answer_timeout, "no stable answer before timeout");
        Ok(String::new())
    }
}

fn decode_texts(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

/// The newest message if one arrived after the question was sent.
fn latest_reply(texts: &[String], baseline: usize) -> String {
    if texts.len() > baseline {
        texts.last().cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

/// Length of the run of identical non-empty reads ending with `current`.
fn next_streak(previous: &str, current: &str, streak: u32) -> u32 {
    if current.is_empty() {
        0
    } else if current == previous {
        streak + 1
    } else {
        1
    }
}

fn response_attempts(timeout: Duration) -> u32 {
    let attempts = timeout.as_millis() / RESPONSE_POLL_INTERVAL.as_millis();
    u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
}
