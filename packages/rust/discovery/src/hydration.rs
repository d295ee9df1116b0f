//! Waiting for the list view to hydrate.

use tracing::{debug, info, warn};

use crate::list_view::ListView;
use crate::poll::{Clock, PollOutcome, RetryPolicy, poll_until};

/// Poll `view` until it renders at least one row.
///
/// Returns the first non-zero row count, or `0` once the policy is
/// exhausted. Read errors during hydration count as zero rows.
pub async fn await_rows<V: ListView + ?Sized>(
    view: &mut V,
    clock: &dyn Clock,
    policy: &RetryPolicy,
) -> usize {
    let outcome = poll_until(
        policy,
        clock,
        async || match view.count_rows().await {
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "row count probe failed");
                0
            }
        },
        |n| *n > 0,
    )
    .await;

    match outcome {
        PollOutcome::Ready { value, attempts } => {
            info!(rows = value, attempts, "list view hydrated");
            value
        }
        PollOutcome::Exhausted { attempts, .. } => {
            warn!(attempts, "list view never rendered any rows");
            0
        }
    }
}
