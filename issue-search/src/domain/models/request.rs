use serde::{Deserialize, Serialize};

use super::{Caller, DEFAULT_PAGE_SIZE};

/// A single search as received from the endpoint layer.
///
/// Values are taken as-is; clamping and validation happen in the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    /// Base filter expression, possibly ending in an ordering clause.
    pub query: String,
    pub start_index: i64,
    pub page_size: i64,
    /// Free-text search term
    pub search_term: Option<String>,
    /// Comma-separated status names
    pub status_filter: Option<String>,
    /// Comma-separated priority names
    pub priority_filter: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    pub include_facets: bool,
    /// `None` for unauthenticated callers.
    pub caller: Option<Caller>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            start_index: 0,
            page_size: DEFAULT_PAGE_SIZE as i64,
            search_term: None,
            status_filter: None,
            priority_filter: None,
            sort_field: None,
            sort_direction: None,
            include_facets: false,
            caller: None,
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn as_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn page(mut self, start_index: i64, page_size: i64) -> Self {
        self.start_index = start_index;
        self.page_size = page_size;
        self
    }

    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn statuses(mut self, statuses: impl Into<String>) -> Self {
        self.status_filter = Some(statuses.into());
        self
    }

    pub fn priorities(mut self, priorities: impl Into<String>) -> Self {
        self.priority_filter = Some(priorities.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = Some(direction.into());
        self
    }

    pub fn with_facets(mut self) -> Self {
        self.include_facets = true;
        self
    }
}

/// Sort direction for the ordering clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than a (trimmed, case-insensitive) `desc` is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|d| d.trim().to_ascii_lowercase()) {
            Some(d) if d == "desc" => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub start: u32,
    pub size: u32,
}

impl PageWindow {
    pub fn new(start: u32, size: u32) -> Self {
        Self { start, size }
    }

    /// Clamp a caller-supplied window: negative starts become 0 and the size
    /// is forced into `1..=max_size`.
    pub fn clamped(start: i64, size: i64, max_size: u32) -> Self {
        let max_size = max_size.max(1);
        Self {
            start: start.clamp(0, u32::MAX as i64) as u32,
            size: size.clamp(1, max_size as i64) as u32,
        }
    }

    pub fn end(self) -> u64 {
        self.start as u64 + self.size as u64
    }
}
