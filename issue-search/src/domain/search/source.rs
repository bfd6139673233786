//! One paging contract over both search backends.
//!
//! The executor and the facet scan only see [`IssuePageSource`]; whether a
//! page came from the primary backend (exact total) or the restricted view
//! (estimated total) is carried by [`TotalCount`].

use async_trait::async_trait;

use crate::domain::{
    models::{Caller, PageWindow, ProjectRef, RawIssue, TotalCount},
    ports::outbound::{PrimarySearchBackend, RestrictedViewBackend},
    BackendError,
};

/// A page of raw records plus what the source knows about the rest.
#[derive(Debug, Clone)]
pub struct SourcePage {
    pub records: Vec<RawIssue>,
    pub total: TotalCount,
    pub has_next_page: bool,
}

#[async_trait]
pub trait IssuePageSource: Send + Sync {
    async fn fetch_page(&self, window: PageWindow) -> Result<SourcePage, BackendError>;
}

/// Pages of an already-parsed query on the primary backend.
pub struct PrimaryPageSource<'a, B: PrimarySearchBackend> {
    backend: &'a B,
    caller: &'a Caller,
    query: &'a B::Query,
}

impl<'a, B: PrimarySearchBackend> PrimaryPageSource<'a, B> {
    pub fn new(backend: &'a B, caller: &'a Caller, query: &'a B::Query) -> Self {
        Self {
            backend,
            caller,
            query,
        }
    }
}

#[async_trait]
impl<B: PrimarySearchBackend> IssuePageSource for PrimaryPageSource<'_, B> {
    async fn fetch_page(&self, window: PageWindow) -> Result<SourcePage, BackendError> {
        let page = self.backend.execute(self.caller, self.query, window).await?;
        Ok(SourcePage {
            has_next_page: window.end() < page.total,
            total: TotalCount::Exact(page.total),
            records: page.records,
        })
    }
}

/// Pages of a project's restricted view.
pub struct RestrictedPageSource<'a> {
    backend: &'a dyn RestrictedViewBackend,
    caller: &'a Caller,
    project: &'a ProjectRef,
}

impl<'a> RestrictedPageSource<'a> {
    pub fn new(
        backend: &'a dyn RestrictedViewBackend,
        caller: &'a Caller,
        project: &'a ProjectRef,
    ) -> Self {
        Self {
            backend,
            caller,
            project,
        }
    }
}

#[async_trait]
impl IssuePageSource for RestrictedPageSource<'_> {
    async fn fetch_page(&self, window: PageWindow) -> Result<SourcePage, BackendError> {
        let page = self.backend.query(self.caller, self.project, window).await?;
        Ok(SourcePage {
            total: TotalCount::estimate(
                window.start,
                page.records.len(),
                page.has_next_page,
                window.size,
            ),
            has_next_page: page.has_next_page,
            records: page.records,
        })
    }
}
