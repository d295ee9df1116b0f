//! Discovery of notebooks from the SPA list page.
//!
//! The list renders asynchronously and exposes no API, so discovery drives
//! a browser: wait for the table to hydrate, read every row, then click each
//! row in turn to learn its notebook URL, returning to the list in between.
//!
//! - [`driver`]: page-automation capability ([`PageDriver`])
//! - [`poll`]: bounded polling with an injectable [`Clock`]
//! - [`list_view`]: typed list queries ([`ListView`], [`DriverListView`])
//! - [`discover`]: the orchestrator tying it together

pub mod driver;
pub mod extract;
pub mod hydration;
pub mod list_view;
pub mod poll;
pub mod resolve;
pub mod title;

use tracing::{info, instrument};

use nbshelf_shared::{DiscoveredNotebook, DiscoveryConfig, NbshelfError, Result};

pub use driver::{
    ENTER_KEY, ElementHandle, LaunchOptions, PageDriver, SessionLauncher, WaitUntil,
};
pub use extract::{CandidateRow, extract_rows};
pub use hydration::await_rows;
pub use list_view::{DriverListView, ListView};
pub use poll::{Attempts, Clock, PollOutcome, RetryPolicy, TokioClock, poll_until};
pub use resolve::{Resolution, Unresolved, resettle, resolve};
pub use title::check_title;

// ---------------------------------------------------------------------------
// Progress trait
// ---------------------------------------------------------------------------

/// Progress callback for discovery runs.
pub trait DiscoveryProgress: Send + Sync {
    /// Called once the candidate rows are known.
    fn rows_found(&self, total: usize);
    /// Called after each row's resolution attempt.
    fn row_resolved(&self, current: usize, total: usize, entry: &DiscoveredNotebook);
}

/// No-op discovery progress.
pub struct SilentDiscoveryProgress;

impl DiscoveryProgress for SilentDiscoveryProgress {
    fn rows_found(&self, _total: usize) {}
    fn row_resolved(&self, _current: usize, _total: usize, _entry: &DiscoveredNotebook) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Enumerate the notebook list and resolve every row to its URL.
///
/// 1. Open the list (failure is fatal)
/// 2. Wait for hydration; no rows means an empty snapshot
/// 3. Extract candidate rows
/// 4. Resolve each row in order, re-settling the list after each
///
/// Every candidate yields exactly one entry; rows that could not be
/// resolved keep `url: None`.
#[instrument(skip_all, fields(home = %config.home_url))]
pub async fn discover<V: ListView + ?Sized>(
    view: &mut V,
    clock: &dyn Clock,
    config: &DiscoveryConfig,
    progress: &dyn DiscoveryProgress,
) -> Result<Vec<DiscoveredNotebook>> {
    view.open().await.map_err(|e| match e {
        NbshelfError::Navigation(_) => e,
        other => NbshelfError::Navigation(format!("opening notebook list: {other}")),
    })?;

    let hydration = RetryPolicy::new(config.hydration_interval, config.hydration_attempts);
    if await_rows(view, clock, &hydration).await == 0 {
        return Ok(Vec::new());
    }

    let candidates = extract_rows(&view.row_texts().await?);
    let total = candidates.len();
    progress.rows_found(total);
    info!(rows = total, "resolving notebook URLs");

    let resettle_policy = RetryPolicy::new(config.resettle_interval, config.resettle_attempts);
    let mut snapshot = Vec::with_capacity(total);

    for (i, row) in candidates.iter().enumerate() {
        let resolution = resolve(view, &row.title).await;
        let entry = DiscoveredNotebook {
            title: row.title.clone(),
            url: resolution.into_url(),
            sources: row.sources().to_string(),
            date: row.date().to_string(),
        };
        progress.row_resolved(i + 1, total, &entry);
        snapshot.push(entry);

        resettle(view, clock, &resettle_policy, total).await;
    }

    let resolved = snapshot.iter().filter(|e| e.url.is_some()).count();
    info!(total, resolved, "discovery complete");

    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Test fakes
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, VecDeque};

    use async_trait::async_trait;

    use super::*;

    /// What clicking a row does.
    #[derive(Debug, Clone)]
    pub(crate) enum Click {
        Lands(&'static str),
        Stalls,
        Throws,
    }

    /// In-memory list view. Rows not given a [`Click`] are not clickable.
    #[derive(Debug, Default)]
    pub(crate) struct FakeListView {
        pub(crate) rows: Vec<Vec<String>>,
        pub(crate) hydration: VecDeque<usize>,
        pub(crate) title_cells: VecDeque<usize>,
        pub(crate) clicks: HashMap<String, Click>,
        pub(crate) pending: Option<Click>,
        pub(crate) clicked: Vec<String>,
        pub(crate) opens: usize,
        pub(crate) open_fails: bool,
    }

    impl FakeListView {
        /// A fully hydrated list of `titles`, each with sources and date columns.
        pub(crate) fn new(titles: &[&str]) -> Self {
            let rows = titles
                .iter()
                .map(|t| vec![t.to_string(), "1 source".into(), "Jan 1, 2025".into()])
                .collect();
            Self {
                rows,
                ..Default::default()
            }
        }

        pub(crate) fn with_hydration(counts: Vec<usize>) -> Self {
            Self {
                hydration: counts.into(),
                ..Default::default()
            }
        }

        pub(crate) fn click(mut self, title: &str, click: Click) -> Self {
            self.clicks.insert(title.to_string(), click);
            self
        }

        pub(crate) fn title_cell_counts(mut self, counts: Vec<usize>) -> Self {
            self.title_cells = counts.into();
            self
        }
    }

    #[async_trait]
    impl ListView for FakeListView {
        async fn open(&mut self) -> Result<()> {
            if self.open_fails {
                return Err(NbshelfError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
            }
            self.opens += 1;
            self.pending = None;
            Ok(())
        }

        async fn count_rows(&mut self) -> Result<usize> {
            Ok(self
                .hydration
                .pop_front()
                .unwrap_or(self.rows.len() * 3))
        }

        async fn count_title_cells(&mut self) -> Result<usize> {
            Ok(self.title_cells.pop_front().unwrap_or(self.rows.len()))
        }

        async fn row_texts(&mut self) -> Result<Vec<Vec<String>>> {
            Ok(self.rows.clone())
        }

        async fn click_row_by_title(&mut self, title: &str) -> Result<bool> {
            self.clicked.push(title.to_string());
            match self.clicks.get(title) {
                Some(Click::Throws) => Err(NbshelfError::driver("element click intercepted")),
                Some(click) => {
                    self.pending = Some(click.clone());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn await_detail_url(&mut self) -> Result<Option<String>> {
            match self.pending.take() {
                Some(Click::Lands(url)) => Ok(Some(url.to_string())),
                _ => Ok(None),
            }
        }
    }
}
