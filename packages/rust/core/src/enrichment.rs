//! Enrichment driver: ask each notebook the fixed question and store the
//! normalized description and topics.

use tracing::{info, instrument, warn};

use nbshelf_discovery::Clock;
use nbshelf_normalize::normalize;
use nbshelf_shared::{EnrichConfig, Library, Timestamp};

use crate::answer::QuestionAnswerer;

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for enrichment runs.
pub trait EnrichmentProgress: Send + Sync {
    /// Called before asking the notebook behind `slug`.
    fn record_started(&self, current: usize, total: usize, slug: &str);
    /// Called once `slug` was either updated or skipped.
    fn record_finished(&self, slug: &str, updated: bool);
}

/// No-op enrichment progress.
pub struct SilentEnrichmentProgress;

impl EnrichmentProgress for SilentEnrichmentProgress {
    fn record_started(&self, _current: usize, _total: usize, _slug: &str) {}
    fn record_finished(&self, _slug: &str, _updated: bool) {}
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Enrich the records behind `slugs`, in order.
///
/// A record is skipped when it is missing, has no URL, or its answer is
/// empty or failed; the rest of the batch continues. Returns the number of
/// records updated.
#[instrument(skip_all, fields(targets = slugs.len()))]
pub async fn enrich(
    library: &mut Library,
    slugs: &[String],
    answerer: &mut dyn QuestionAnswerer,
    clock: &dyn Clock,
    config: &EnrichConfig,
    progress: &dyn EnrichmentProgress,
) -> usize {
    let total = slugs.len();
    let mut updated = 0;

    for (i, slug) in slugs.iter().enumerate() {
        progress.record_started(i + 1, total, slug);

        let Some(url) = library.notebooks.get(slug).and_then(|nb| nb.url.clone()) else {
            warn!(%slug, "no notebook URL, skipping");
            progress.record_finished(slug, false);
            continue;
        };

        if i > 0 {
            clock.sleep(config.pause).await;
        }

        let answer = match answerer.ask(&config.question, &url).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                warn!(%slug, "empty answer, skipping");
                progress.record_finished(slug, false);
                continue;
            }
            Err(e) => {
                warn!(%slug, error = %e, "question failed, skipping");
                progress.record_finished(slug, false);
                continue;
            }
        };

        let content = normalize(&answer);
        if let Some(record) = library.notebooks.get_mut(slug) {
            record.description = content.description;
            if !content.topics.is_empty() {
                record.topics = content.topics;
            }
            record.updated_at = Timestamp::now();
            updated += 1;
            info!(%slug, topics = record.topics.len(), "notebook enriched");
        }
        progress.record_finished(slug, true);
    }

    if updated > 0 {
        library.touch();
    }
    info!(updated, total, "enrichment complete");

    updated
}
