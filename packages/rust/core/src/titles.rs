//! Read-only audit of stored names against the notebooks' own titles.

use serde::Serialize;
use tracing::{info, instrument, warn};

use nbshelf_discovery::{Clock, PageDriver, check_title};
use nbshelf_shared::{Library, TitleConfig};

/// Outcome of checking one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TitleStatus {
    Match,
    Mismatch { actual: String },
    /// The page loaded but no title could be read.
    Unknown,
    /// The page could not be opened.
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleCheck {
    pub slug: String,
    pub stored: String,
    pub url: String,
    pub result: TitleStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TitleReport {
    pub checks: Vec<TitleCheck>,
}

impl TitleReport {
    pub fn mismatches(&self) -> impl Iterator<Item = &TitleCheck> {
        self.checks
            .iter()
            .filter(|c| matches!(c.result, TitleStatus::Mismatch { .. }))
    }

    pub fn count(&self, pred: impl Fn(&TitleStatus) -> bool) -> usize {
        self.checks.iter().filter(|c| pred(&c.result)).count()
    }
}

/// Progress callback for title audits.
pub trait AuditProgress: Send + Sync {
    fn title_checked(&self, current: usize, total: usize, check: &TitleCheck);
}

/// No-op audit progress.
pub struct SilentAuditProgress;

impl AuditProgress for SilentAuditProgress {
    fn title_checked(&self, _current: usize, _total: usize, _check: &TitleCheck) {}
}

/// Check every record that has a URL. Never mutates the library.
#[instrument(skip_all, fields(records = library.notebooks.len()))]
pub async fn audit_titles<D: PageDriver + ?Sized>(
    driver: &mut D,
    clock: &dyn Clock,
    library: &Library,
    config: &TitleConfig,
    progress: &dyn AuditProgress,
) -> TitleReport {
    let targets: Vec<_> = library
        .notebooks
        .iter()
        .filter_map(|(slug, nb)| nb.url.as_deref().map(|url| (slug, nb, url)))
        .collect();
    let total = targets.len();
    let mut report = TitleReport::default();

    for (i, (slug, record, url)) in targets.into_iter().enumerate() {
        if i > 0 {
            clock.sleep(config.pause).await;
        }

        let result = match check_title(driver, clock, url, config).await {
            Ok(Some(actual)) if actual.trim() == record.name.trim() => TitleStatus::Match,
            Ok(Some(actual)) => TitleStatus::Mismatch { actual },
            Ok(None) => TitleStatus::Unknown,
            Err(e) => {
                warn!(%slug, error = %e, "title check failed");
                TitleStatus::Error {
                    message: e.to_string(),
                }
            }
        };

        let check = TitleCheck {
            slug: slug.clone(),
            stored: record.name.clone(),
            url: url.to_string(),
            result,
        };
        progress.title_checked(i + 1, total, &check);
        report.checks.push(check);
    }

    info!(
        checked = report.checks.len(),
        mismatched = report.mismatches().count(),
        "title audit complete"
    );
    report
}
