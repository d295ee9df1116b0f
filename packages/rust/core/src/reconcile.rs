//! Merging a discovery snapshot into the library.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use nbshelf_shared::{DiscoveredNotebook, Library, NotebookRecord};

/// Insert every snapshot entry whose URL the library does not know yet.
///
/// Entries without a URL are skipped. Existing records are never renamed or
/// rewritten. Returns the slugs that were added, in snapshot order.
#[instrument(skip_all, fields(snapshot = snapshot.len(), known = library.notebooks.len()))]
pub fn reconcile(library: &mut Library, snapshot: &[DiscoveredNotebook]) -> Vec<String> {
    let mut added = Vec::new();

    for entry in snapshot {
        let Some(url) = entry.url.as_deref() else {
            continue;
        };
        if library.contains_url(url) {
            debug!(title = %entry.title, url, "already in library");
            continue;
        }

        let slug = library.unused_slug(&entry.title);
        debug!(%slug, url, "adding notebook");
        library
            .notebooks
            .insert(slug.clone(), NotebookRecord::new(slug.clone(), entry.title.clone(), url));
        added.push(slug);
    }

    if !added.is_empty() {
        library.touch();
    }
    info!(added = added.len(), "library reconciled");

    added
}

/// Resolved snapshot entries whose URL the library does not know, first
/// occurrence per URL, in snapshot order. Read-only counterpart of
/// [`reconcile`].
pub fn unlisted(library: &Library, snapshot: &[DiscoveredNotebook]) -> Vec<DiscoveredNotebook> {
    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for entry in snapshot {
        let Some(url) = entry.url.as_deref() else {
            continue;
        };
        if !library.contains_url(url) && seen.insert(url) {
            pending.push(entry.clone());
        }
    }
    pending
}
