use std::sync::Arc;

use serde_json::{json, Value};

use issue_search::{
    adapters::outbound::memory::{Fixture, JsonAttributeSource, MemoryTracker},
    Caller, IssueSearchError, IssueSearchService, IssueSearchServiceImpl, SearchLimits,
    SearchRequest, TotalCount,
};

fn issue(n: u64, status: &str, priority: &str, reporter: &str, day: u32) -> Value {
    json!({
        "id": n,
        "key": format!("HELP-{n}"),
        "summary": format!("Request {n}"),
        "project": { "key": "HELP", "name": "Help Desk" },
        "status": { "id": status.to_lowercase(), "name": status },
        "priority": { "id": priority.to_lowercase(), "name": priority },
        "reporter": { "key": reporter, "displayName": reporter },
        "created": format!("2024-01-{day:02}T09:00:00Z"),
    })
}

fn fixture() -> Fixture {
    let mut help_1 = issue(1, "Open", "High", "alice", 1);
    help_1["customFields"] = json!([
        { "id": "customfield_10010", "typeKey": "select", "value": { "value": "Building A" } }
    ]);
    let mut help_2 = issue(2, "Closed", "Low", "bob", 2);
    help_2["summary"] = json!("Printer jam on floor 3");
    let mut help_3 = issue(3, "Open", "Medium", "alice", 3);
    help_3["due"] = json!("2024-02-01T00:00:00Z");
    help_3["customFields"] = json!([
        { "id": "customfield_10010", "typeKey": "select", "value": { "value": "Building B" } },
        { "id": "customfield_10020", "typeKey": "textfield", "value": "Desk 12" },
        { "id": "customfield_10020", "typeKey": "textfield", "value": "Desk 14" }
    ]);
    let mut help_4 = issue(4, "In Progress", "High", "alice", 4);
    help_4["due"] = json!("2024-03-01T00:00:00Z");
    let help_5 = issue(5, "Closed", "high", "bob", 5);
    let mut ops_1 = issue(6, "Open", "Low", "alice", 6);
    ops_1["key"] = json!("OPS-1");
    ops_1["project"] = json!({ "key": "OPS", "name": "Operations" });

    Fixture::from_json(
        &json!({
            "projects": [
                { "id": "10000", "key": "HELP", "name": "Help Desk",
                  "restrictedViewId": "portal-help", "browsers": ["agent"] },
                { "id": "10001", "key": "OPS", "name": "Operations",
                  "browsers": ["agent", "alice"] }
            ],
            "users": [
                { "key": "agent", "username": "agent", "displayName": "Support Agent" },
                { "key": "alice", "username": "alice", "displayName": "Alice Example" }
            ],
            "issues": [help_1, help_2, help_3, help_4, help_5, ops_1]
        })
        .to_string(),
    )
    .unwrap()
}

fn service_with(limits: SearchLimits) -> IssueSearchServiceImpl<MemoryTracker> {
    let tracker = Arc::new(MemoryTracker::new(fixture()));
    IssueSearchServiceImpl::new(
        tracker.clone(),
        tracker.clone(),
        tracker.clone(),
        tracker,
        Arc::new(JsonAttributeSource),
    )
    .with_limits(limits)
}

fn service() -> IssueSearchServiceImpl<MemoryTracker> {
    service_with(SearchLimits::default())
}

fn agent() -> Caller {
    Caller::new("agent", "agent", "Support Agent")
}

fn alice() -> Caller {
    Caller::new("alice", "alice", "Alice Example")
}

fn keys(result: &issue_search::SearchResult) -> Vec<&str> {
    result.issues.iter().map(|i| i.key.as_str()).collect()
}

#[tokio::test]
async fn anonymous_search_is_empty() {
    let result = service()
        .search(SearchRequest::new("project = HELP"))
        .await
        .unwrap();

    assert!(result.issues.is_empty());
    assert_eq!(result.total_count, TotalCount::Exact(0));
    assert_eq!(result.searched_as.user_key, None);
    assert_eq!(result.searched_as.display_name, "Anonymous (not authenticated)");
}

#[tokio::test]
async fn agent_search_is_exact_and_newest_first() {
    let result = service()
        .search(SearchRequest::new("project = HELP").as_caller(agent()))
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-5", "HELP-4", "HELP-3", "HELP-2", "HELP-1"]);
    assert_eq!(result.total_count, TotalCount::Exact(5));
    assert_eq!(result.resolved_query.as_deref(), Some(r#"project = "HELP""#));
    assert_eq!(result.searched_as.user_key.as_deref(), Some("agent"));
    assert_eq!(result.project_key, None);
}

#[tokio::test]
async fn customer_is_served_by_restricted_view_with_estimate() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(alice())
                .page(0, 2),
        )
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-4", "HELP-3"]);
    assert_eq!(result.total_count, TotalCount::Estimated(4));
    assert!(result.has_next_page);
    assert_eq!(result.project_key.as_deref(), Some("HELP"));
    assert_eq!(
        result.issues[0]
            .project
            .as_ref()
            .and_then(|p| p.restricted_view_id.as_deref()),
        Some("portal-help")
    );
}

#[tokio::test]
async fn customer_without_requests_sees_the_restricted_answer() {
    let carol = Caller::new("carol", "carol", "Carol");
    let result = service()
        .search(SearchRequest::new("project = HELP").as_caller(carol))
        .await
        .unwrap();

    assert!(result.issues.is_empty());
    assert_eq!(result.total_count, TotalCount::Estimated(0));
    assert_eq!(result.project_key.as_deref(), Some("HELP"));
}

#[tokio::test]
async fn facets_ignore_the_active_status_filter() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .statuses("Open")
                .with_facets(),
        )
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-3", "HELP-1"]);
    let facets = result.facets.unwrap();
    assert_eq!(facets.statuses, ["Closed", "In Progress", "Open"]);
    // First spelling in scan order wins; HELP-5 is scanned first.
    assert_eq!(facets.priorities, ["high", "Low", "Medium"]);
    assert!(!facets.truncated);
}

#[tokio::test]
async fn facet_scan_is_bounded() {
    let limits = SearchLimits {
        facet_page_size: 2,
        max_facet_scan: 4,
        ..SearchLimits::default()
    };

    let result = service_with(limits)
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .with_facets(),
        )
        .await
        .unwrap();

    let facets = result.facets.unwrap();
    assert!(facets.truncated);
    // The four newest issues already cover every status.
    assert_eq!(facets.statuses, ["Closed", "In Progress", "Open"]);
}

#[tokio::test]
async fn search_term_matches_keys_and_text() {
    let service = service();

    let by_key = service
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .search_term("help-2"),
        )
        .await
        .unwrap();
    let by_text = service
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .search_term("printer"),
        )
        .await
        .unwrap();

    assert_eq!(keys(&by_key), ["HELP-2"]);
    assert_eq!(keys(&by_text), ["HELP-2"]);
}

#[tokio::test]
async fn sort_alias_replaces_base_ordering() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP ORDER BY key ASC")
                .as_caller(agent())
                .sort("dueDate", "desc"),
        )
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-4", "HELP-3", "HELP-1", "HELP-2", "HELP-5"]);
    assert!(result
        .resolved_query
        .as_deref()
        .is_some_and(|q| q.ends_with("ORDER BY duedate DESC")));
}

#[tokio::test]
async fn invalid_sort_field_keeps_base_ordering() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP ORDER BY key ASC")
                .as_caller(agent())
                .sort("created; DROP", "desc"),
        )
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-1", "HELP-2", "HELP-3", "HELP-4", "HELP-5"]);
}

#[tokio::test]
async fn pagination_is_clamped() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .page(-3, 1000),
        )
        .await
        .unwrap();

    assert_eq!(result.start_index, 0);
    assert_eq!(result.page_size, 100);
    assert_eq!(result.issues.len(), 5);
    assert!(!result.has_next_page);
    assert_eq!(result.current_page, 1);
    assert_eq!(result.total_pages, 1);
}

#[tokio::test]
async fn unknown_field_is_an_invalid_query() {
    let err = service()
        .search(SearchRequest::new("colour = red").as_caller(agent()))
        .await
        .unwrap_err();

    match err {
        IssueSearchError::InvalidQuery { query, diagnostics } => {
            assert_eq!(query, "(colour = red)");
            assert_eq!(
                diagnostics,
                ["Field 'colour' does not exist or you do not have permission to view it."]
            );
        }
        other => panic!("expected InvalidQuery, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_fields_are_projected_to_display_values() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .search_term("HELP-1"),
        )
        .await
        .unwrap();

    assert_eq!(
        result.issues[0].custom_fields.get("customfield_10010").map(String::as_str),
        Some("Building A")
    );
}

#[tokio::test]
async fn repeated_custom_field_keeps_the_other_fields() {
    let result = service()
        .search(
            SearchRequest::new("project = HELP")
                .as_caller(agent())
                .search_term("HELP-3"),
        )
        .await
        .unwrap();

    let fields = &result.issues[0].custom_fields;
    assert_eq!(fields.get("customfield_10010").map(String::as_str), Some("Building B"));
    assert_eq!(fields.get("customfield_10020").map(String::as_str), Some("Desk 12"));
}

#[tokio::test]
async fn project_requests_for_a_customer_use_the_restricted_view() {
    let result = service()
        .search_project_requests(Some(alice()), "help", 0, 10)
        .await
        .unwrap();

    assert_eq!(keys(&result), ["HELP-4", "HELP-3", "HELP-1"]);
    assert_eq!(result.total_count, TotalCount::Estimated(3));
    assert_eq!(result.project_key.as_deref(), Some("HELP"));
}

#[tokio::test]
async fn project_issues_for_a_browser_use_the_primary_backend() {
    let service = service();

    let all = service
        .search_all_project_issues(Some(alice()), "OPS", 0, 10)
        .await
        .unwrap();
    let filtered = service
        .search_project_issues_with_filter(Some(agent()), "HELP", "status = Closed", 0, 10)
        .await
        .unwrap();

    assert_eq!(keys(&all), ["OPS-1"]);
    assert_eq!(all.total_count, TotalCount::Exact(1));
    assert_eq!(all.project_key.as_deref(), Some("OPS"));
    assert_eq!(keys(&filtered), ["HELP-5", "HELP-2"]);
}

#[tokio::test]
async fn project_visibility() {
    let service = service();

    assert!(service.can_caller_see_project(Some(&agent()), "HELP").await);
    assert!(!service.can_caller_see_project(Some(&alice()), "HELP").await);
    assert!(service.can_caller_see_project(Some(&alice()), "ops").await);
    assert!(!service.can_caller_see_project(None, "OPS").await);
}
