//! Resolving a list row to its notebook URL.
//!
//! Each resolution clicks a row, which navigates the shared browser away
//! from the list. The caller must [`resettle`] before resolving the next
//! row, so resolutions are strictly sequential.

use tracing::{debug, warn};

use crate::list_view::ListView;
use crate::poll::{Clock, RetryPolicy, poll_until};

/// Why a row produced no URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No first-column cell with exactly this title was rendered.
    RowNotFound,
    /// The click did not reach a notebook page in time.
    Timeout,
    /// The driver failed during click or wait.
    Failed(String),
}

/// Per-row outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved(Unresolved),
}

impl Resolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Resolved(url) => Some(url.as_str()),
            Self::Unresolved(_) => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Self::Resolved(url) => Some(url),
            Self::Unresolved(_) => None,
        }
    }
}

/// Click the row titled `title` and capture the notebook URL it opens.
///
/// Exact title match; with duplicate titles the first rendered row wins.
/// Never fails: driver errors become [`Unresolved::Failed`].
pub async fn resolve<V: ListView + ?Sized>(view: &mut V, title: &str) -> Resolution {
    let clicked = match view.click_row_by_title(title).await {
        Ok(clicked) => clicked,
        Err(e) => {
            warn!(%title, error = %e, "row click failed");
            return Resolution::Unresolved(Unresolved::Failed(e.to_string()));
        }
    };

    if !clicked {
        warn!(%title, "row not found");
        return Resolution::Unresolved(Unresolved::RowNotFound);
    }

    match view.await_detail_url().await {
        Ok(Some(url)) => {
            debug!(%title, %url, "row resolved");
            Resolution::Resolved(url)
        }
        Ok(None) => {
            warn!(%title, "notebook page did not open in time");
            Resolution::Unresolved(Unresolved::Timeout)
        }
        Err(e) => {
            warn!(%title, error = %e, "waiting for notebook page failed");
            Resolution::Unresolved(Unresolved::Failed(e.to_string()))
        }
    }
}

/// Return to the list and wait until at least `expected` titled rows are
/// rendered again.
///
/// Returns whether the list fully re-rendered within the policy. A failed
/// navigation is logged and the poll still runs; the next resolution then
/// degrades to unresolved rather than aborting the batch.
pub async fn resettle<V: ListView + ?Sized>(
    view: &mut V,
    clock: &dyn Clock,
    policy: &RetryPolicy,
    expected: usize,
) -> bool {
    if let Err(e) = view.open().await {
        warn!(error = %e, "returning to list failed");
    }

    let outcome = poll_until(
        policy,
        clock,
        async || view.count_title_cells().await.unwrap_or(0),
        |n| *n >= expected,
    )
    .await;

    let settled = outcome.is_ready();
    if !settled {
        warn!(expected, "list did not fully re-render");
    }
    settled
}
