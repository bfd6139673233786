//! Scriptable test doubles for the outbound ports.

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, RwLock,
};

use async_trait::async_trait;

use crate::domain::{
    models::{Caller, CustomAttribute, PageWindow, ProjectRef, RawIssue},
    ports::outbound::{
        BackendPage, BackendQuery, CapabilityChecker, CustomAttributeSource,
        PrimarySearchBackend, ProjectResolver, RestrictedPage, RestrictedViewBackend,
    },
    AttributeError, BackendError,
};

#[derive(Debug, Clone)]
pub struct MockQuery {
    pub text: String,
}

impl BackendQuery for MockQuery {
    fn resolved_text(&self) -> String {
        self.text.clone()
    }
}

/// Primary backend returning slices of a fixed record list for any query.
#[derive(Clone, Default)]
pub struct MockPrimaryBackend {
    records: Arc<Vec<RawIssue>>,
    parse_error: Option<BackendError>,
    execute_error: Option<BackendError>,
    /// Executes beyond this many fail with `Unavailable`.
    succeed_executes: Option<usize>,
    parsed: Arc<RwLock<Vec<String>>>,
    executes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockPrimaryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, records: Vec<RawIssue>) -> Self {
        self.records = Arc::new(records);
        self
    }

    pub fn rejecting(mut self, diagnostic: &str) -> Self {
        self.parse_error = Some(BackendError::rejected(diagnostic));
        self
    }

    pub fn failing_execute(mut self, error: BackendError) -> Self {
        self.execute_error = Some(error);
        self
    }

    pub fn failing_after(mut self, executes: usize) -> Self {
        self.succeed_executes = Some(executes);
        self
    }

    /// Every query text passed to `parse`, in order.
    pub fn parsed_queries(&self) -> Vec<String> {
        self.parsed.read().unwrap().clone()
    }

    pub fn execute_count(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrimarySearchBackend for MockPrimaryBackend {
    type Query = MockQuery;

    async fn parse(&self, _caller: &Caller, query: &str) -> Result<MockQuery, BackendError> {
        self.parsed.write().unwrap().push(query.to_string());
        if let Some(error) = &self.parse_error {
            return Err(error.clone());
        }
        Ok(MockQuery {
            text: query.to_string(),
        })
    }

    async fn execute(
        &self,
        _caller: &Caller,
        _query: &MockQuery,
        window: PageWindow,
    ) -> Result<BackendPage, BackendError> {
        let n = self.executes.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.execute_error {
            return Err(error.clone());
        }
        if self.succeed_executes.is_some_and(|limit| n >= limit) {
            return Err(BackendError::unavailable("search index went away"));
        }

        let records = self
            .records
            .iter()
            .skip(window.start as usize)
            .take(window.size as usize)
            .cloned()
            .collect();
        Ok(BackendPage {
            records,
            total: self.records.len() as u64,
        })
    }
}

/// Restricted view returning a fixed response.
#[derive(Clone)]
pub struct MockRestrictedView {
    response: Result<RestrictedPage, BackendError>,
    calls: Arc<AtomicUsize>,
}

impl MockRestrictedView {
    pub fn returning(records: Vec<RawIssue>, has_next_page: bool) -> Self {
        Self {
            response: Ok(RestrictedPage {
                records,
                has_next_page,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(BackendError::unavailable("customer portal offline")),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestrictedViewBackend for MockRestrictedView {
    async fn query(
        &self,
        _caller: &Caller,
        _project: &ProjectRef,
        _window: PageWindow,
    ) -> Result<RestrictedPage, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Project directory with per-user browse grants.
#[derive(Clone, Default)]
pub struct MockAccess {
    projects: HashMap<String, ProjectRef>,
    browsers: HashMap<String, HashSet<String>>,
}

impl MockAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project; `restricted_view` makes it fallback-eligible.
    pub fn with_project(mut self, key: &str, restricted_view: Option<&str>) -> Self {
        self.projects.insert(
            key.to_string(),
            ProjectRef {
                id: format!("{}", 10_000 + self.projects.len()),
                key: key.to_string(),
                name: format!("{key} project"),
                restricted_view_id: restricted_view.map(str::to_string),
            },
        );
        self
    }

    pub fn with_browser(mut self, key: &str, user_key: &str) -> Self {
        self.browsers
            .entry(key.to_string())
            .or_default()
            .insert(user_key.to_string());
        self
    }
}

#[async_trait]
impl CapabilityChecker for MockAccess {
    async fn can_browse(&self, caller: &Caller, project: &ProjectRef) -> bool {
        self.browsers
            .get(&project.key)
            .is_some_and(|users| users.contains(&caller.key))
    }
}

#[async_trait]
impl ProjectResolver for MockAccess {
    async fn resolve(&self, project_key: &str) -> Option<ProjectRef> {
        self.projects.get(project_key).cloned()
    }

    async fn is_fallback_eligible(&self, project: &ProjectRef) -> bool {
        project.restricted_view_id.is_some()
    }
}

/// Attribute source for records without custom fields.
#[derive(Clone, Copy, Default)]
pub struct NoAttributes;

impl CustomAttributeSource for NoAttributes {
    fn attributes(&self, _issue: &RawIssue) -> Result<Vec<CustomAttribute>, AttributeError> {
        Ok(Vec::new())
    }
}
