use std::{sync::Arc, sync::LazyLock, time::Instant};

use async_trait::async_trait;
use regex::Regex;

use crate::domain::{
    models::{Caller, FacetSet, PageWindow, SearchLimits, SearchRequest, SearchResult},
    ports::{
        inbound::IssueSearchService,
        outbound::{
            BackendQuery, CapabilityChecker, CustomAttributeSource, PrimarySearchBackend,
            ProjectResolver, RestrictedViewBackend,
        },
    },
    search::{
        assembler::{anonymous_result, primary_result, restricted_result, ResultContext},
        executor::{run_page, Projector},
        facets::scan_facets,
        fallback::FallbackCoordinator,
        rewriter::{build_augmented_query, QueryRefinements},
        sort::normalize_sort,
        source::PrimaryPageSource,
    },
    BackendError, IssueSearchError,
};

static PROJECT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-]*$").unwrap());

fn validated_project_key(raw: &str) -> Result<String, IssueSearchError> {
    let key = raw.trim();
    if PROJECT_KEY.is_match(key) {
        Ok(key.to_ascii_uppercase())
    } else {
        Err(IssueSearchError::InvalidQuery {
            query: raw.to_string(),
            diagnostics: vec![format!("'{raw}' is not a valid project key")],
        })
    }
}

pub struct IssueSearchServiceImpl<B> {
    primary: Arc<B>,
    restricted: Arc<dyn RestrictedViewBackend>,
    capabilities: Arc<dyn CapabilityChecker>,
    projects: Arc<dyn ProjectResolver>,
    attributes: Arc<dyn CustomAttributeSource>,
    limits: SearchLimits,
}

impl<B: PrimarySearchBackend> IssueSearchServiceImpl<B> {
    pub fn new(
        primary: Arc<B>,
        restricted: Arc<dyn RestrictedViewBackend>,
        capabilities: Arc<dyn CapabilityChecker>,
        projects: Arc<dyn ProjectResolver>,
        attributes: Arc<dyn CustomAttributeSource>,
    ) -> Self {
        Self {
            primary,
            restricted,
            capabilities,
            projects,
            attributes,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Facets over the base query and search term only, so the dropdowns
    /// keep offering values the current filters exclude. Never fails the
    /// search.
    async fn compute_facets(
        &self,
        caller: &Caller,
        base: &str,
        refinements: &QueryRefinements,
    ) -> Option<FacetSet> {
        let facet_query = build_augmented_query(base, &refinements.without_attribute_filters(), None);
        let parsed = match self.primary.parse(caller, &facet_query).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(facet_query = %facet_query, error = %e, "Facet query rejected");
                return None;
            }
        };

        let source = PrimaryPageSource::new(self.primary.as_ref(), caller, &parsed);
        match scan_facets(
            &source,
            self.limits.facet_page_size,
            self.limits.max_facet_scan,
        )
        .await
        {
            Ok(facets) => Some(facets),
            Err(e) => {
                tracing::warn!(facet_query = %facet_query, error = %e, "Facet scan failed");
                None
            }
        }
    }

    async fn search_scoped(
        &self,
        caller: Option<Caller>,
        project_key: String,
        query: String,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError> {
        let request = SearchRequest {
            query,
            start_index,
            page_size,
            caller,
            ..Default::default()
        };
        let mut result = self.search(request).await?;
        result.project_key = Some(project_key);
        Ok(result)
    }
}

#[async_trait]
impl<B: PrimarySearchBackend> IssueSearchService for IssueSearchServiceImpl<B> {
    #[tracing::instrument(
        name = "issue_search",
        skip_all,
        fields(
            query = %request.query,
            start_index = request.start_index,
            page_size = request.page_size,
            user_key = request.caller.as_ref().map(|c| c.key.as_str()),
        )
    )]
    async fn search(&self, request: SearchRequest) -> Result<SearchResult, IssueSearchError> {
        let started = Instant::now();
        let window = PageWindow::clamped(
            request.start_index,
            request.page_size,
            self.limits.max_page_size,
        );

        let Some(caller) = request.caller.as_ref() else {
            tracing::warn!("Issue search without an authenticated caller");
            return Ok(anonymous_result(&request.query, window));
        };

        let refinements = QueryRefinements::from_request(&request);
        let sort = normalize_sort(
            request.sort_field.as_deref(),
            request.sort_direction.as_deref(),
        );
        let augmented = build_augmented_query(&request.query, &refinements, sort.as_ref());
        tracing::debug!(augmented_query = %augmented, "Built augmented query");

        let parsed = self
            .primary
            .parse(caller, &augmented)
            .await
            .map_err(|e| {
                tracing::info!(augmented_query = %augmented, error = %e, "Query rejected");
                IssueSearchError::from_backend(&augmented, e)
            })?;
        let resolved = parsed.resolved_text();

        let projector = Projector::new(self.attributes.as_ref(), self.projects.as_ref());
        let fallback = FallbackCoordinator::new(
            self.restricted.as_ref(),
            self.capabilities.as_ref(),
            self.projects.as_ref(),
        );
        let context = || ResultContext {
            query: &request.query,
            resolved_query: Some(resolved.clone()),
            caller,
            window,
            started,
        };

        // At most one fallback attempt per request.
        let target = fallback.target(caller, &request.query, Some(&resolved)).await;
        let mut fallback_outcome = None;
        if let Some(project) = &target {
            if let Some(outcome) = fallback.run(caller, project, window, &projector).await {
                if !outcome.issues.is_empty() {
                    tracing::info!(
                        project_key = %project.key,
                        returned = outcome.issues.len(),
                        "Served by restricted view"
                    );
                    return Ok(restricted_result(context(), outcome, &project.key));
                }
                fallback_outcome = Some(outcome);
            }
        }

        let source = PrimaryPageSource::new(self.primary.as_ref(), caller, &parsed);
        let outcome = match run_page(&source, window, &projector).await {
            Ok(outcome) => outcome,
            Err(e @ BackendError::Rejected(_)) => {
                return Err(IssueSearchError::from_backend(&augmented, e));
            }
            Err(e) => {
                tracing::error!(augmented_query = %augmented, error = %e, "Primary search failed");
                return match (target, fallback_outcome) {
                    (Some(project), Some(outcome)) => {
                        Ok(restricted_result(context(), outcome, &project.key))
                    }
                    _ => Err(IssueSearchError::from_backend(&augmented, e)),
                };
            }
        };

        // Nothing anywhere: report the restricted view's answer.
        if outcome.total.value() == 0 {
            if let (Some(project), Some(restricted)) = (&target, fallback_outcome) {
                return Ok(restricted_result(context(), restricted, &project.key));
            }
        }

        let facets = if request.include_facets {
            self.compute_facets(caller, &request.query, &refinements)
                .await
        } else {
            None
        };

        tracing::debug!(
            returned = outcome.issues.len(),
            total = outcome.total.value(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Issue search complete"
        );
        Ok(primary_result(context(), outcome, facets))
    }

    async fn search_project_requests(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError> {
        let key = validated_project_key(project_key)?;
        let query = format!("project = {key} AND reporter = currentUser() ORDER BY created DESC");
        self.search_scoped(caller, key, query, start_index, page_size)
            .await
    }

    async fn search_all_project_issues(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError> {
        let key = validated_project_key(project_key)?;
        let query = format!("project = {key} ORDER BY created DESC");
        self.search_scoped(caller, key, query, start_index, page_size)
            .await
    }

    async fn search_project_issues_with_filter(
        &self,
        caller: Option<Caller>,
        project_key: &str,
        filter: &str,
        start_index: i64,
        page_size: i64,
    ) -> Result<SearchResult, IssueSearchError> {
        let key = validated_project_key(project_key)?;
        let filter = filter.trim();
        let query = if filter.is_empty() {
            format!("project = {key} ORDER BY created DESC")
        } else {
            format!("project = {key} AND ({filter}) ORDER BY created DESC")
        };
        self.search_scoped(caller, key, query, start_index, page_size)
            .await
    }

    async fn can_caller_see_project(&self, caller: Option<&Caller>, project_key: &str) -> bool {
        let Some(caller) = caller else {
            return false;
        };
        let Ok(key) = validated_project_key(project_key) else {
            return false;
        };
        let Some(project) = self.projects.resolve(&key).await else {
            return false;
        };
        if !self.capabilities.can_browse(caller, &project).await {
            return false;
        }

        match self.primary.parse(caller, &format!("project = {key}")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(project_key = %key, error = %e, "Project query rejected");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::mock::{
        MockAccess, MockPrimaryBackend, MockRestrictedView, NoAttributes,
    };
    use crate::domain::models::{
        RawIssue, RawProject, RawStatus, TotalCount, ANONYMOUS_DISPLAY_NAME,
    };

    fn alice() -> Caller {
        Caller::new("alice", "alice", "Alice Example")
    }

    fn raw(n: u64, project: &str, status: &str) -> RawIssue {
        RawIssue {
            id: n,
            key: format!("{project}-{n}"),
            summary: Some(format!("Issue {n}")),
            project: Some(RawProject {
                key: project.to_string(),
                name: format!("{project} project"),
            }),
            status: Some(RawStatus {
                id: "1".into(),
                name: status.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn service(
        primary: MockPrimaryBackend,
        restricted: MockRestrictedView,
        access: MockAccess,
    ) -> IssueSearchServiceImpl<MockPrimaryBackend> {
        let access = Arc::new(access);
        IssueSearchServiceImpl::new(
            Arc::new(primary),
            Arc::new(restricted),
            access.clone(),
            access,
            Arc::new(NoAttributes),
        )
    }

    fn browsable_help() -> MockAccess {
        MockAccess::new()
            .with_project("HELP", Some("portal-1"))
            .with_browser("HELP", "alice")
    }

    #[tokio::test]
    async fn anonymous_caller_gets_empty_result_without_backend_calls() {
        let primary = MockPrimaryBackend::new().with_records(vec![raw(1, "HELP", "Open")]);
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let result = svc.search(SearchRequest::new("project = HELP")).await.unwrap();

        assert!(result.issues.is_empty());
        assert_eq!(result.total_count, TotalCount::Exact(0));
        assert_eq!(result.searched_as.display_name, ANONYMOUS_DISPLAY_NAME);
        assert!(primary.parsed_queries().is_empty());
        assert_eq!(primary.execute_count(), 0);
    }

    #[tokio::test]
    async fn page_window_is_clamped() {
        let records = (1..=150).map(|n| raw(n, "HELP", "Open")).collect();
        let svc = service(
            MockPrimaryBackend::new().with_records(records),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let result = svc
            .search(
                SearchRequest::new("project = HELP")
                    .as_caller(alice())
                    .page(-5, 1000),
            )
            .await
            .unwrap();

        assert_eq!(result.start_index, 0);
        assert_eq!(result.page_size, 100);
        assert_eq!(result.issues.len(), 100);
        assert!(result.has_next_page);
        assert!(!result.has_previous_page);
        assert_eq!(result.total_pages, 2);
    }

    #[tokio::test]
    async fn refinements_and_sort_reach_the_backend() {
        let primary = MockPrimaryBackend::new();
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        svc.search(
            SearchRequest::new("project = HELP ORDER BY key")
                .as_caller(alice())
                .statuses("Open")
                .sort("created", "desc"),
        )
        .await
        .unwrap();

        assert_eq!(
            primary.parsed_queries(),
            vec![r#"(project = HELP) AND status IN ("Open") ORDER BY created DESC"#]
        );
    }

    #[tokio::test]
    async fn rejected_query_is_an_invalid_query_error() {
        let svc = service(
            MockPrimaryBackend::new().rejecting("Field 'colour' does not exist"),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let err = svc
            .search(SearchRequest::new("colour = red").as_caller(alice()))
            .await
            .unwrap_err();

        match err {
            IssueSearchError::InvalidQuery { diagnostics, .. } => {
                assert_eq!(diagnostics, vec!["Field 'colour' does not exist"]);
            }
            other => panic!("expected InvalidQuery, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unavailable_backend_is_an_internal_error() {
        let svc = service(
            MockPrimaryBackend::new().failing_execute(BackendError::unavailable("down")),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let err = svc
            .search(SearchRequest::new("project = HELP").as_caller(alice()))
            .await
            .unwrap_err();

        assert!(matches!(err, IssueSearchError::Internal(_)));
    }

    #[tokio::test]
    async fn restricted_view_serves_callers_without_browse() {
        let restricted = MockRestrictedView::returning(
            vec![raw(7, "HELP", "Open"), raw(8, "HELP", "Waiting")],
            true,
        );
        let primary = MockPrimaryBackend::new();
        let svc = service(
            primary.clone(),
            restricted.clone(),
            MockAccess::new().with_project("HELP", Some("portal-1")),
        );

        let result = svc
            .search(
                SearchRequest::new("project = HELP")
                    .as_caller(alice())
                    .page(0, 2)
                    .with_facets(),
            )
            .await
            .unwrap();

        assert_eq!(restricted.call_count(), 1);
        assert_eq!(primary.execute_count(), 0);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.total_count, TotalCount::Estimated(4));
        assert!(result.has_next_page);
        assert_eq!(result.project_key.as_deref(), Some("HELP"));
        assert!(result.facets.is_none());
        assert_eq!(
            result.issues[0].project.as_ref().and_then(|p| p.restricted_view_id.as_deref()),
            Some("portal-1")
        );
    }

    #[tokio::test]
    async fn restricted_view_is_skipped_for_callers_with_browse() {
        let restricted = MockRestrictedView::returning(vec![raw(7, "HELP", "Open")], false);
        let svc = service(
            MockPrimaryBackend::new(),
            restricted.clone(),
            browsable_help(),
        );

        let result = svc
            .search(SearchRequest::new("project = HELP").as_caller(alice()))
            .await
            .unwrap();

        assert_eq!(restricted.call_count(), 0);
        assert_eq!(result.total_count, TotalCount::Exact(0));
        assert_eq!(result.project_key, None);
    }

    #[tokio::test]
    async fn failing_fallback_degrades_to_primary_result() {
        let restricted = MockRestrictedView::failing();
        let svc = service(
            MockPrimaryBackend::new(),
            restricted.clone(),
            MockAccess::new().with_project("HELP", Some("portal-1")),
        );

        let result = svc
            .search(SearchRequest::new("project = HELP").as_caller(alice()))
            .await
            .unwrap();

        assert_eq!(restricted.call_count(), 1);
        assert!(result.issues.is_empty());
        assert_eq!(result.total_count, TotalCount::Exact(0));
    }

    #[tokio::test]
    async fn empty_fallback_covers_an_unavailable_primary() {
        let svc = service(
            MockPrimaryBackend::new().failing_execute(BackendError::unavailable("down")),
            MockRestrictedView::returning(vec![], false),
            MockAccess::new().with_project("HELP", Some("portal-1")),
        );

        let result = svc
            .search(SearchRequest::new("project = HELP").as_caller(alice()))
            .await
            .unwrap();

        assert_eq!(result.total_count, TotalCount::Estimated(0));
        assert_eq!(result.project_key.as_deref(), Some("HELP"));
    }

    #[tokio::test]
    async fn empty_fallback_is_reported_when_primary_finds_nothing() {
        let primary = MockPrimaryBackend::new();
        let restricted = MockRestrictedView::returning(vec![], false);
        let svc = service(
            primary.clone(),
            restricted.clone(),
            MockAccess::new().with_project("HELP", Some("portal-1")),
        );

        let result = svc
            .search(
                SearchRequest::new("project = HELP")
                    .as_caller(alice())
                    .with_facets(),
            )
            .await
            .unwrap();

        assert_eq!(restricted.call_count(), 1);
        assert_eq!(primary.execute_count(), 1);
        assert!(result.issues.is_empty());
        assert_eq!(result.total_count, TotalCount::Estimated(0));
        assert_eq!(result.project_key.as_deref(), Some("HELP"));
        assert!(result.facets.is_none());
    }

    #[tokio::test]
    async fn facet_query_drops_status_and_priority_filters() {
        let primary = MockPrimaryBackend::new().with_records(vec![
            raw(1, "HELP", "Open"),
            raw(2, "HELP", "Closed"),
        ]);
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let result = svc
            .search(
                SearchRequest::new("project = HELP")
                    .as_caller(alice())
                    .search_term("printer")
                    .statuses("Open")
                    .priorities("High")
                    .with_facets(),
            )
            .await
            .unwrap();

        let parsed = primary.parsed_queries();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].contains("status IN"));
        assert!(!parsed[1].contains("status IN"));
        assert!(!parsed[1].contains("priority IN"));
        assert!(parsed[1].contains(r#"text ~ "printer""#));

        let facets = result.facets.unwrap();
        assert_eq!(facets.statuses, vec!["Closed", "Open"]);
    }

    #[tokio::test]
    async fn facet_failure_leaves_facets_empty() {
        let svc = service(
            MockPrimaryBackend::new()
                .with_records(vec![raw(1, "HELP", "Open")])
                .failing_after(1),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let result = svc
            .search(
                SearchRequest::new("project = HELP")
                    .as_caller(alice())
                    .with_facets(),
            )
            .await
            .unwrap();

        assert_eq!(result.issues.len(), 1);
        assert!(result.facets.is_none());
    }

    #[tokio::test]
    async fn project_requests_query_is_scoped_to_reporter() {
        let primary = MockPrimaryBackend::new();
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let result = svc
            .search_project_requests(Some(alice()), "help", 0, 10)
            .await
            .unwrap();

        assert_eq!(
            primary.parsed_queries(),
            vec!["(project = HELP AND reporter = currentUser()) ORDER BY created DESC"]
        );
        assert_eq!(result.project_key.as_deref(), Some("HELP"));
    }

    #[tokio::test]
    async fn project_filter_is_wrapped_and_blank_filter_ignored() {
        let primary = MockPrimaryBackend::new();
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        svc.search_project_issues_with_filter(Some(alice()), "HELP", "status = Open OR x = y", 0, 10)
            .await
            .unwrap();
        svc.search_project_issues_with_filter(Some(alice()), "HELP", "  ", 0, 10)
            .await
            .unwrap();

        assert_eq!(
            primary.parsed_queries(),
            vec![
                "(project = HELP AND (status = Open OR x = y)) ORDER BY created DESC",
                "(project = HELP) ORDER BY created DESC",
            ]
        );
    }

    #[tokio::test]
    async fn invalid_project_key_is_rejected_before_the_backend() {
        let primary = MockPrimaryBackend::new();
        let svc = service(
            primary.clone(),
            MockRestrictedView::returning(vec![], false),
            browsable_help(),
        );

        let err = svc
            .search_all_project_issues(Some(alice()), "HELP OR 1=1", 0, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, IssueSearchError::InvalidQuery { .. }));
        assert!(primary.parsed_queries().is_empty());
    }

    #[tokio::test]
    async fn project_visibility_requires_browse() {
        let svc = service(
            MockPrimaryBackend::new(),
            MockRestrictedView::returning(vec![], false),
            browsable_help().with_project("OPS", None),
        );

        assert!(svc.can_caller_see_project(Some(&alice()), "help").await);
        assert!(!svc.can_caller_see_project(Some(&alice()), "OPS").await);
        assert!(!svc.can_caller_see_project(Some(&alice()), "NOPE").await);
        assert!(!svc.can_caller_see_project(None, "HELP").await);
    }
}
