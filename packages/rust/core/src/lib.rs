//! Library maintenance on top of discovery.
//!
//! - [`reconcile`] merges a discovery snapshot into the library
//! - [`enrichment`] asks each notebook the enrichment question and stores
//!   the normalized answer
//! - [`answer`] is the browser-backed question answerer
//! - [`titles`] audits stored names against live page titles
//! - [`pipeline`] ties these to a browser session that is always closed

pub mod answer;
pub mod enrichment;
pub mod pipeline;
pub mod reconcile;
pub mod titles;

#[cfg(test)]
pub(crate) mod testing;

pub use answer::{BrowserAnswerer, QuestionAnswerer};
pub use enrichment::{EnrichmentProgress, SilentEnrichmentProgress, enrich};
pub use pipeline::{DiscoverOptions, DiscoverOutcome, Pipeline, ProgressReporter, SilentProgress};
pub use reconcile::{reconcile, unlisted};
pub use titles::{AuditProgress, TitleCheck, TitleReport, TitleStatus, audit_titles};
