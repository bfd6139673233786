//! Bounded scan computing dropdown facets over the whole matching set.

use std::collections::BTreeMap;

use super::source::IssuePageSource;
use crate::domain::{
    models::{FacetSet, PageWindow},
    BackendError,
};

/// Case-insensitive, sorted, first-spelling-wins set of names.
#[derive(Debug, Default)]
struct NameSet(BTreeMap<String, String>);

impl NameSet {
    fn insert(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.0
            .entry(name.to_lowercase())
            .or_insert_with(|| name.to_string());
    }

    fn into_sorted(self) -> Vec<String> {
        self.0.into_values().collect()
    }
}

/// Scan `source` from the start and collect distinct status and priority
/// names.
///
/// Pages are at most `page_size` long and at most `max_scan` records are
/// scanned in total. The scan stops on an empty page, a short page, or once
/// the reported total has been consumed.
pub async fn scan_facets(
    source: &dyn IssuePageSource,
    page_size: u32,
    max_scan: u32,
) -> Result<FacetSet, BackendError> {
    let page_size = page_size.max(1);
    let mut statuses = NameSet::default();
    let mut priorities = NameSet::default();
    let mut scanned: u32 = 0;
    let mut reported_total: u64 = 0;

    while scanned < max_scan {
        let requested = page_size.min(max_scan - scanned);
        let page = source
            .fetch_page(PageWindow::new(scanned, requested))
            .await?;
        reported_total = page.total.value();

        if page.records.is_empty() {
            break;
        }

        // A misbehaving backend may return more than asked for; never count
        // past the cap.
        let take = page.records.len().min(requested as usize);
        for issue in &page.records[..take] {
            if let Some(status) = &issue.status {
                statuses.insert(&status.name);
            }
            if let Some(priority) = &issue.priority {
                priorities.insert(&priority.name);
            }
        }

        scanned += take as u32;
        if scanned as u64 >= reported_total || take < requested as usize {
            break;
        }
    }

    let truncated = scanned >= max_scan && reported_total > scanned as u64;
    if truncated {
        tracing::debug!(scanned, reported_total, "Facet scan reached its cap");
    }

    Ok(FacetSet {
        statuses: statuses.into_sorted(),
        priorities: priorities.into_sorted(),
        truncated,
    })
}
