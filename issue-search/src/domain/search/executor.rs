use std::collections::HashMap;

use itertools::Itertools;

use super::{
    projection::to_issue_record,
    source::{IssuePageSource, SourcePage},
};
use crate::domain::{
    models::{IssueRecord, PageWindow, RawIssue, TotalCount},
    ports::outbound::{CustomAttributeSource, ProjectResolver},
    BackendError,
};

/// A projected page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub issues: Vec<IssueRecord>,
    pub total: TotalCount,
    pub has_next_page: bool,
}

/// Turns raw pages into [`IssueRecord`]s.
pub struct Projector<'a> {
    attributes: &'a dyn CustomAttributeSource,
    projects: &'a dyn ProjectResolver,
}

impl<'a> Projector<'a> {
    pub fn new(attributes: &'a dyn CustomAttributeSource, projects: &'a dyn ProjectResolver) -> Self {
        Self {
            attributes,
            projects,
        }
    }

    /// Project a page of records, resolving each distinct project once.
    pub async fn project(&self, records: Vec<RawIssue>) -> Vec<IssueRecord> {
        let keys = records
            .iter()
            .filter_map(|r| r.project.as_ref().map(|p| p.key.clone()))
            .unique()
            .collect::<Vec<_>>();

        let mut restricted_views = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(view_id) = self
                .projects
                .resolve(&key)
                .await
                .and_then(|p| p.restricted_view_id)
            {
                restricted_views.insert(key, view_id);
            }
        }

        records
            .into_iter()
            .map(|raw| to_issue_record(raw, self.attributes, &restricted_views))
            .collect()
    }
}

/// Fetch one page from `source` and project it.
pub async fn run_page(
    source: &dyn IssuePageSource,
    window: PageWindow,
    projector: &Projector<'_>,
) -> Result<PageOutcome, BackendError> {
    let SourcePage {
        records,
        total,
        has_next_page,
    } = source.fetch_page(window).await?;

    let issues = projector.project(records).await;
    tracing::debug!(
        returned = issues.len(),
        total = total.value(),
        estimated = total.is_estimate(),
        "Fetched issue page"
    );

    Ok(PageOutcome {
        issues,
        total,
        has_next_page,
    })
}
