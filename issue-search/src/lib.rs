//! Issue search orchestration.
//!
//! Rewrites a caller-supplied filter expression with free-text, attribute and
//! ordering refinements, runs it against the primary search backend, falls
//! back to a restricted customer view when the caller cannot browse the
//! target project, and optionally computes dropdown facets over the whole
//! matching set.
//!
//! The domain layer only talks to the outside world through the ports in
//! [`domain::ports::outbound`]. [`adapters::outbound::memory`] provides an
//! in-memory implementation of all of them, backed by a JSON fixture.

pub mod adapters;
pub mod domain;

pub use domain::models::{
    Caller, FacetSet, IssueRecord, PageWindow, SearchLimits, SearchRequest, SearchResult,
    SortDirection, TotalCount,
};
pub use domain::ports::inbound::IssueSearchService;
pub use domain::services::IssueSearchServiceImpl;
pub use domain::{BackendError, IssueSearchError};
