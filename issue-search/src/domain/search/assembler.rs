//! Builds the single [`SearchResult`] shape from whichever path served the
//! request.

use std::time::Instant;

use super::executor::PageOutcome;
use crate::domain::models::{
    Caller, FacetSet, PageWindow, SearchResult, SearchedAs, TotalCount,
};

/// Everything known about a served request, minus the page itself.
pub struct ResultContext<'a> {
    pub query: &'a str,
    pub resolved_query: Option<String>,
    pub caller: &'a Caller,
    pub window: PageWindow,
    pub started: Instant,
}

/// Result for a caller without identity: empty, with an explicit echo.
pub fn anonymous_result(query: &str, window: PageWindow) -> SearchResult {
    SearchResult {
        issues: Vec::new(),
        total_count: TotalCount::Exact(0),
        start_index: window.start,
        page_size: window.size,
        has_next_page: false,
        has_previous_page: window.start > 0,
        current_page: current_page(window),
        total_pages: 0,
        query: query.to_string(),
        resolved_query: None,
        project_key: None,
        searched_as: SearchedAs::anonymous(),
        execution_time_ms: 0,
        facets: None,
    }
}

/// Result served by the primary backend.
pub fn primary_result(
    context: ResultContext<'_>,
    outcome: PageOutcome,
    facets: Option<FacetSet>,
) -> SearchResult {
    assemble(context, outcome, None, facets)
}

/// Result served by a project's restricted view. Facets are not computed on
/// this path.
pub fn restricted_result(
    context: ResultContext<'_>,
    outcome: PageOutcome,
    project_key: &str,
) -> SearchResult {
    let mut result = assemble(context, outcome, Some(project_key.to_string()), None);
    // The restricted view has no real query; echo the base query when the
    // backend never resolved one.
    if result.resolved_query.is_none() {
        result.resolved_query = Some(result.query.clone());
    }
    result
}

fn assemble(
    context: ResultContext<'_>,
    outcome: PageOutcome,
    project_key: Option<String>,
    facets: Option<FacetSet>,
) -> SearchResult {
    let ResultContext {
        query,
        resolved_query,
        caller,
        window,
        started,
    } = context;

    let total = outcome.total.value();
    SearchResult {
        issues: outcome.issues,
        total_count: outcome.total,
        start_index: window.start,
        page_size: window.size,
        has_next_page: outcome.has_next_page,
        has_previous_page: window.start > 0,
        current_page: current_page(window),
        total_pages: total.div_ceil(window.size.max(1) as u64),
        query: query.to_string(),
        resolved_query,
        project_key,
        searched_as: SearchedAs {
            user_key: Some(caller.key.clone()),
            user_name: Some(caller.username.clone()),
            display_name: caller.display_name.clone(),
        },
        execution_time_ms: started.elapsed().as_millis() as u64,
        facets,
    }
}

fn current_page(window: PageWindow) -> u32 {
    window.start / window.size.max(1) + 1
}
