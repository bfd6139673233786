use async_trait::async_trait;

use crate::domain::{
    models::{Caller, SearchRequest, SearchResult},
    IssueSearchError,
};

/// Inbound port for issue search.
///
/// This trait defines the use cases the endpoint layer can invoke. Every
/// call builds its state fresh; nothing is cached between requests.
#[async_trait]
pub trait IssueSearchService: Send + Sync + 'static {
    /// Run a search. Returns a structurally complete result unless the backend
    /// rejects the query or fails unrecoverably.
    async fn search(&self, request: SearchRequest) -> Result<SearchResult, IssueSearchError>;

    /// Requests the caller reported in a project, newest first.
    async fn search_project_requests(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError>;

    /// Every issue of a project visible to the caller, newest first.
    async fn search_all_project_issues(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError>;

    /// Issues of a project narrowed by an additional filter expression,
    /// newest first. A blank filter behaves like
    /// [`search_all_project_issues`](Self::search_all_project_issues).
    async fn search_project_issues_with_filter(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        filter: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError>;

    /// Whether the caller can search a project through the primary backend.
    /// Never fails; any problem answers `false`.
    async fn can_caller_see_project(&self, caller: Option<&Caller>, project_key: &str) -> bool;
}
