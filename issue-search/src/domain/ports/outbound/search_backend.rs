use async_trait::async_trait;

use crate::domain::{
    models::{Caller, PageWindow, RawIssue},
    BackendError,
};

/// A query the primary backend has parsed and accepted.
pub trait BackendQuery: Send + Sync {
    /// The query text after backend normalization (functions such as
    /// `currentUser()` resolved).
    fn resolved_text(&self) -> String;
}

/// One page of primary search results.
#[derive(Debug, Clone, Default)]
pub struct BackendPage {
    pub records: Vec<RawIssue>,
    /// Exact number of issues matching the query.
    pub total: u64,
}

/// Outbound port for the primary search backend.
///
/// The backend owns the query language: it is the authority on whether a
/// query is valid and on which issues the caller may see.
#[async_trait]
pub trait PrimarySearchBackend: Send + Sync + 'static {
    type Query: BackendQuery;

    /// Parse and validate `query` on behalf of `caller`.
    ///
    /// Malformed queries are reported as [`BackendError::Rejected`] with the
    /// backend's diagnostics.
    async fn parse(&self, caller: &Caller, query: &str) -> Result<Self::Query, BackendError>;

    /// Run a parsed query for one page window.
    async fn execute(
        &self,
        caller: &Caller,
        query: &Self::Query,
        window: PageWindow,
    ) -> Result<BackendPage, BackendError>;
}
