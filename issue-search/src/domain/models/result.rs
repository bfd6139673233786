use serde::Serialize;

use super::IssueRecord;

pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous (not authenticated)";

/// Total matching count for a search.
///
/// The primary backend reports an exact total. The restricted view only says
/// whether another page exists, so totals from that path are an upper-bound
/// estimate that is never below the number of items actually returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TotalCount {
    Exact(u64),
    Estimated(u64),
}

impl TotalCount {
    pub fn value(self) -> u64 {
        match self {
            Self::Exact(n) | Self::Estimated(n) => n,
        }
    }

    pub fn is_estimate(self) -> bool {
        matches!(self, Self::Estimated(_))
    }

    /// Estimate for a page of `returned` items starting at `start`: the items
    /// seen so far, plus one page of slack when more pages are signalled.
    pub fn estimate(start: u32, returned: usize, has_next_page: bool, page_size: u32) -> Self {
        let seen = start as u64 + returned as u64;
        if has_next_page {
            Self::Estimated(seen + (page_size as u64).max(returned as u64))
        } else {
            Self::Estimated(seen)
        }
    }
}

/// Distinct status and priority names across a matching set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSet {
    /// Case-insensitively deduplicated and sorted
    pub statuses: Vec<String>,
    /// Case-insensitively deduplicated and sorted
    pub priorities: Vec<String>,
    /// The scan stopped at its cap while more matches were reported.
    pub truncated: bool,
}

/// Who the search ran as, echoed back for debugging permission mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchedAs {
    pub user_key: Option<String>,
    pub user_name: Option<String>,
    pub display_name: String,
}

impl SearchedAs {
    pub fn anonymous() -> Self {
        Self {
            user_key: None,
            user_name: None,
            display_name: ANONYMOUS_DISPLAY_NAME.to_string(),
        }
    }
}

/// The single response shape, whichever path produced the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub issues: Vec<IssueRecord>,
    pub total_count: TotalCount,
    pub start_index: u32,
    pub page_size: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub current_page: u32,
    pub total_pages: u64,
    /// The caller's base query, unchanged.
    pub query: String,
    /// The query as normalized by the backend.
    pub resolved_query: Option<String>,
    pub project_key: Option<String>,
    pub searched_as: SearchedAs,
    pub execution_time_ms: u64,
    pub facets: Option<FacetSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_without_more_pages_is_items_seen() {
        assert_eq!(TotalCount::estimate(40, 7, false, 20), TotalCount::Estimated(47));
        assert_eq!(TotalCount::estimate(0, 0, false, 20), TotalCount::Estimated(0));
    }

    #[test]
    fn estimate_with_more_pages_adds_one_page() {
        assert_eq!(TotalCount::estimate(20, 20, true, 20), TotalCount::Estimated(60));
        // A page larger than requested still never under-counts.
        assert_eq!(TotalCount::estimate(0, 30, true, 20), TotalCount::Estimated(60));
    }

    #[test]
    fn total_count_serializes_with_its_kind() {
        let json = serde_json::to_value(TotalCount::Estimated(12)).expect("serialize total");
        assert_eq!(json, serde_json::json!({ "kind": "estimated", "value": 12 }));
    }
}
