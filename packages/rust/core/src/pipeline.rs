//! Session-scoped runs: launch a browser, do the work, always close it.
//!
//! Library reads happen before the browser starts, so a corrupt library
//! aborts the run without opening a session. Writes happen after the
//! session is closed, once, as a whole document. A run that is cancelled
//! or panics drops the driver instead, and the driver's own `Drop` releases
//! the session.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use nbshelf_discovery::{
    Clock, DiscoveryProgress, DriverListView, LaunchOptions, PageDriver, SessionLauncher,
    TokioClock, discover,
};
use nbshelf_shared::{
    AppConfig, DiscoveredNotebook, DiscoveryConfig, EnrichConfig, Library, Result, TitleConfig,
};
use nbshelf_storage::LibraryStore;

use crate::answer::BrowserAnswerer;
use crate::enrichment::{EnrichmentProgress, enrich};
use crate::reconcile::{reconcile, unlisted};
use crate::titles::{AuditProgress, TitleCheck, TitleReport, audit_titles};

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for whole runs.
pub trait ProgressReporter: DiscoveryProgress + EnrichmentProgress + AuditProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl DiscoveryProgress for SilentProgress {
    fn rows_found(&self, _total: usize) {}
    fn row_resolved(&self, _current: usize, _total: usize, _entry: &DiscoveredNotebook) {}
}

impl EnrichmentProgress for SilentProgress {
    fn record_started(&self, _current: usize, _total: usize, _slug: &str) {}
    fn record_finished(&self, _slug: &str, _updated: bool) {}
}

impl AuditProgress for SilentProgress {
    fn title_checked(&self, _current: usize, _total: usize, _check: &TitleCheck) {}
}

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
}

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// What to do with a discovery snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverOptions {
    /// Add newly discovered notebooks to the library.
    pub sync: bool,
    /// Enrich every library record that still lacks a description.
    pub enrich: bool,
}

/// Result of [`Pipeline::discover`].
#[derive(Debug, Default, Serialize)]
pub struct DiscoverOutcome {
    /// Every discovered row, in list order.
    pub snapshot: Vec<DiscoveredNotebook>,
    /// Resolved rows whose URL was not in the library when the run started.
    pub new_notebooks: Vec<DiscoveredNotebook>,
    /// Slugs added to the library.
    pub added: Vec<String>,
    /// Records enriched.
    pub enriched: usize,
    #[serde(skip)]
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs discovery, sync, enrichment and title audits against one launcher.
pub struct Pipeline<L: SessionLauncher> {
    launcher: L,
    launch: LaunchOptions,
    clock: Box<dyn Clock>,
    discovery: DiscoveryConfig,
    enrichment: EnrichConfig,
    titles: TitleConfig,
}

impl<L: SessionLauncher> Pipeline<L> {
    pub fn new(launcher: L, config: &AppConfig) -> Self {
        Self {
            launcher,
            launch: LaunchOptions {
                headless: config.browser.headless,
                user_data_dir: config.browser.user_data_dir.clone(),
            },
            clock: Box::new(TokioClock),
            discovery: DiscoveryConfig::from(config),
            enrichment: EnrichConfig::from(config),
            titles: TitleConfig::from(config),
        }
    }

    /// Override the configured headless mode.
    pub fn headless(mut self, headless: bool) -> Self {
        self.launch.headless = headless;
        self
    }

    /// Replace the clock used for polling and pauses.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Discover the notebook list, then optionally sync and enrich.
    ///
    /// The library is always read, so the outcome can name the notebooks it
    /// does not know yet. It is only written when sync or enrichment changed
    /// something.
    #[instrument(skip_all, fields(sync = opts.sync, enrich = opts.enrich))]
    pub async fn discover<P: ProgressReporter>(
        &self,
        store: &LibraryStore,
        opts: DiscoverOptions,
        progress: &P,
    ) -> Result<DiscoverOutcome> {
        let start = Instant::now();
        let mut library = store.load()?;

        progress.phase("Starting browser");
        let mut driver = self.launcher.launch(&self.launch).await?;
        let result = self
            .discover_in_session(&mut driver, &mut library, opts, progress)
            .await;
        close_session(&mut driver).await;
        let mut outcome = result?;

        if !outcome.added.is_empty() || outcome.enriched > 0 {
            progress.phase("Saving library");
            store.save(&library)?;
        }

        outcome.elapsed = start.elapsed();
        info!(
            found = outcome.snapshot.len(),
            new = outcome.new_notebooks.len(),
            added = outcome.added.len(),
            enriched = outcome.enriched,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "discover run complete"
        );
        Ok(outcome)
    }

    async fn discover_in_session<P: ProgressReporter>(
        &self,
        driver: &mut L::Driver,
        library: &mut Library,
        opts: DiscoverOptions,
        progress: &P,
    ) -> Result<DiscoverOutcome> {
        progress.phase("Discovering notebooks");
        let snapshot = {
            let mut view = DriverListView::new(&mut *driver, self.discovery.clone());
            discover(&mut view, self.clock.as_ref(), &self.discovery, progress).await?
        };

        let mut outcome = DiscoverOutcome {
            new_notebooks: unlisted(library, &snapshot),
            snapshot,
            ..Default::default()
        };

        if opts.sync {
            progress.phase("Updating library");
            outcome.added = reconcile(library, &outcome.snapshot);
        }

        if opts.enrich {
            let slugs = library.unenriched_slugs();
            if !slugs.is_empty() {
                progress.phase("Enriching notebooks");
                let mut answerer =
                    BrowserAnswerer::new(&mut *driver, self.clock.as_ref(), &self.enrichment);
                outcome.enriched = enrich(
                    library,
                    &slugs,
                    &mut answerer,
                    self.clock.as_ref(),
                    &self.enrichment,
                    progress,
                )
                .await;
            }
        }

        Ok(outcome)
    }

    /// Compare every stored name with the title its notebook page shows.
    #[instrument(skip_all)]
    pub async fn audit_titles<P: ProgressReporter>(
        &self,
        store: &LibraryStore,
        progress: &P,
    ) -> Result<TitleReport> {
        let library = store.load()?;

        progress.phase("Starting browser");
        let mut driver = self.launcher.launch(&self.launch).await?;

        progress.phase("Checking titles");
        let report = audit_titles(
            &mut driver,
            self.clock.as_ref(),
            &library,
            &self.titles,
            progress,
        )
        .await;
        close_session(&mut driver).await;

        Ok(report)
    }
}

/// Close the session; a failed close is logged, never returned, so it
/// cannot mask the run's own result.
async fn close_session<D: PageDriver>(driver: &mut D) {
    if let Err(e) = driver.close().await {
        warn!(error = %e, "failed to close browser session");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use nbshelf_shared::{NbshelfError, NotebookRecord};
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeClock, FakeDriver, FakeLauncher};

    const HOME: &str = "https://notebooklm.google.com/";

    fn app_config() -> AppConfig {
        AppConfig::default()
    }

    fn store() -> (tempfile::TempDir, LibraryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::new(dir.path().join("library.json"));
        (dir, store)
    }

    fn listing_driver() -> FakeDriver {
        let mut driver = FakeDriver {
            links: HashMap::from([
                ("Alpha".to_string(), "https://notebooklm.google.com/notebook/A".to_string()),
                ("Beta".to_string(), "https://notebooklm.google.com/notebook/B".to_string()),
            ]),
            ..Default::default()
        };
        driver.evaluations.extend([
            // hydration: cell count
            json!(6),
            // row texts
            json!([["Alpha", "2 sources", "Jan 1, 2025"], ["Beta", "1 source", "Feb 2, 2025"]]),
            // resettle after Alpha, then after Beta
            json!(2),
            json!(2),
        ]);
        driver
    }

    #[tokio::test]
    async fn discover_only_leaves_library_untouched() {
        let (_dir, store) = store();
        let launcher = FakeLauncher::with_driver(listing_driver());
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());

        let outcome = pipeline
            .discover(&store, DiscoverOptions::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.snapshot.len(), 2);
        assert_eq!(
            outcome.snapshot[0].url.as_deref(),
            Some("https://notebooklm.google.com/notebook/A")
        );
        assert_eq!(outcome.snapshot[1].sources, "1 source");
        assert_eq!(outcome.new_notebooks.len(), 2);
        assert!(outcome.added.is_empty());
        assert!(!store.path().exists());
        assert_eq!(pipeline.launcher.closes(), 1);
    }

    #[tokio::test]
    async fn sync_and_enrich_persist_library() {
        let (_dir, store) = store();
        let mut driver = listing_driver();
        driver.present = HashSet::from(["textarea.query-box-input".to_string()]);
        driver.evaluations.extend([
            // Alpha: baseline, then three identical reads
            json!([]),
            json!(["Alpha covers testing."]),
            json!(["Alpha covers testing."]),
            json!(["Alpha covers testing."]),
            // Beta: baseline, then three identical reads
            json!([]),
            json!(["Beta covers tracing."]),
            json!(["Beta covers tracing."]),
            json!(["Beta covers tracing."]),
        ]);
        let launcher = FakeLauncher::with_driver(driver);
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());
        let opts = DiscoverOptions {
            sync: true,
            enrich: true,
        };

        let outcome = pipeline.discover(&store, opts, &SilentProgress).await.unwrap();

        assert_eq!(outcome.added, vec!["alpha", "beta"]);
        assert_eq!(outcome.enriched, 2);
        let saved = store.load().unwrap();
        assert_eq!(saved.notebooks["alpha"].description, "Alpha covers testing.");
        assert_eq!(saved.notebooks["beta"].description, "Beta covers tracing.");
        assert_eq!(pipeline.launcher.closes(), 1);
    }

    #[tokio::test]
    async fn second_sync_adds_nothing() {
        let (_dir, store) = store();
        let mut library = Library::default();
        for (slug, name, url) in [
            ("alpha", "Alpha", "https://notebooklm.google.com/notebook/A"),
            ("beta", "Beta", "https://notebooklm.google.com/notebook/B"),
        ] {
            let mut record = NotebookRecord::new(slug, name, url);
            record.description = "done".into();
            library.notebooks.insert(slug.into(), record);
        }
        store.save(&library).unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let launcher = FakeLauncher::with_driver(listing_driver());
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());
        let opts = DiscoverOptions {
            sync: true,
            enrich: false,
        };

        let outcome = pipeline.discover(&store, opts, &SilentProgress).await.unwrap();

        assert!(outcome.added.is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn plain_discover_names_notebooks_missing_from_library() {
        let (_dir, store) = store();
        let mut library = Library::default();
        library.notebooks.insert(
            "alpha".into(),
            NotebookRecord::new("alpha", "Alpha", "https://notebooklm.google.com/notebook/A"),
        );
        store.save(&library).unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let launcher = FakeLauncher::with_driver(listing_driver());
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());

        let outcome = pipeline
            .discover(&store, DiscoverOptions::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.new_notebooks.len(), 1);
        assert_eq!(outcome.new_notebooks[0].title, "Beta");
        assert!(outcome.added.is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn failed_home_navigation_is_fatal_and_closes_session() {
        let (_dir, store) = store();
        let mut driver = listing_driver();
        driver.failing_urls.insert(HOME.to_string());
        let launcher = FakeLauncher::with_driver(driver);
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());

        let err = pipeline
            .discover(&store, DiscoverOptions::default(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, NbshelfError::Navigation(_)));
        assert_eq!(pipeline.launcher.closes(), 1);
    }

    #[tokio::test]
    async fn launch_failure_is_fatal() {
        let (_dir, store) = store();
        let pipeline =
            Pipeline::new(FakeLauncher::default(), &app_config()).with_clock(FakeClock::default());

        let err = pipeline
            .discover(&store, DiscoverOptions::default(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, NbshelfError::Session(_)));
    }

    #[tokio::test]
    async fn corrupt_library_aborts_before_launch() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{ not json").unwrap();
        let launcher = FakeLauncher::with_driver(listing_driver());
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());
        let opts = DiscoverOptions {
            sync: true,
            enrich: false,
        };

        let err = pipeline.discover(&store, opts, &SilentProgress).await.unwrap_err();

        assert!(matches!(err, NbshelfError::Storage(_)));
        assert!(pipeline.launcher.driver.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn title_audit_runs_in_one_session() {
        let (_dir, store) = store();
        let mut library = Library::default();
        library.notebooks.insert(
            "alpha".into(),
            NotebookRecord::new("alpha", "Alpha", "https://notebooklm.google.com/notebook/A"),
        );
        store.save(&library).unwrap();

        let mut driver = FakeDriver::default();
        driver.titles.insert(
            "https://notebooklm.google.com/notebook/A".into(),
            "Alpha - NotebookLM".into(),
        );
        let launcher = FakeLauncher::with_driver(driver);
        let pipeline = Pipeline::new(launcher, &app_config()).with_clock(FakeClock::default());

        let report = pipeline.audit_titles(&store, &SilentProgress).await.unwrap();

        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.mismatches().count(), 0);
        assert_eq!(pipeline.launcher.closes(), 1);
    }
}
