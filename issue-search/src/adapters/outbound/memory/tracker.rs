use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use super::{
    fixture::{Fixture, FixtureError, FixtureProject},
    query::{parse_query, MemoryQuery},
};
use crate::domain::{
    models::{Caller, PageWindow, ProjectRef, RawIssue},
    ports::outbound::{
        BackendPage, CapabilityChecker, PrimarySearchBackend, ProjectResolver, RestrictedPage,
        RestrictedViewBackend,
    },
    BackendError,
};

/// Issue tracker held entirely in memory.
///
/// Implements every outbound search port: the primary backend only sees
/// projects the caller may browse, while the restricted view lists a
/// project's issues reported by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    projects: HashMap<String, FixtureProject>,
    users: Vec<Caller>,
    issues: Vec<RawIssue>,
}

impl MemoryTracker {
    pub fn new(fixture: Fixture) -> Self {
        let projects = fixture
            .projects
            .into_iter()
            .map(|p| (p.key.to_ascii_uppercase(), p))
            .collect();
        Self {
            projects,
            users: fixture.users,
            issues: fixture.issues,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Fixture::from_path(path).map(Self::new)
    }

    /// Look up a known user by key.
    pub fn user(&self, key: &str) -> Option<Caller> {
        self.users.iter().find(|u| u.key == key).cloned()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn project(&self, key: &str) -> Option<&FixtureProject> {
        self.projects.get(&key.to_ascii_uppercase())
    }

    fn may_browse(&self, caller: &Caller, project_key: &str) -> bool {
        self.project(project_key)
            .is_some_and(|p| p.browsers.iter().any(|b| *b == caller.key))
    }
}

fn page_of(issues: Vec<&RawIssue>, window: PageWindow) -> (Vec<RawIssue>, u64) {
    let total = issues.len() as u64;
    let records = issues
        .into_iter()
        .skip(window.start as usize)
        .take(window.size as usize)
        .cloned()
        .collect();
    (records, total)
}

#[async_trait]
impl PrimarySearchBackend for MemoryTracker {
    type Query = MemoryQuery;

    async fn parse(&self, caller: &Caller, query: &str) -> Result<MemoryQuery, BackendError> {
        parse_query(caller, query)
    }

    async fn execute(
        &self,
        caller: &Caller,
        query: &MemoryQuery,
        window: PageWindow,
    ) -> Result<BackendPage, BackendError> {
        let mut matching = self
            .issues
            .iter()
            .filter(|issue| {
                issue
                    .project
                    .as_ref()
                    .is_some_and(|p| self.may_browse(caller, &p.key))
            })
            .filter(|issue| query.matches(issue))
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| query.compare(a, b));

        let (records, total) = page_of(matching, window);
        tracing::debug!(
            user_key = %caller.key,
            total,
            returned = records.len(),
            "Evaluated query in memory"
        );
        Ok(BackendPage { records, total })
    }
}

#[async_trait]
impl RestrictedViewBackend for MemoryTracker {
    async fn query(
        &self,
        caller: &Caller,
        project: &ProjectRef,
        window: PageWindow,
    ) -> Result<RestrictedPage, BackendError> {
        if self.project(&project.key).is_none() {
            return Err(BackendError::unavailable(format!(
                "no restricted view for project {}",
                project.key
            )));
        }

        let mut requests = self
            .issues
            .iter()
            .filter(|issue| {
                issue
                    .project
                    .as_ref()
                    .is_some_and(|p| p.key.eq_ignore_ascii_case(&project.key))
            })
            .filter(|issue| issue.reporter.as_ref().is_some_and(|r| r.key == caller.key))
            .collect::<Vec<_>>();
        requests.sort_by(|a, b| b.created.cmp(&a.created).then(a.id.cmp(&b.id)));

        let (records, total) = page_of(requests, window);
        Ok(RestrictedPage {
            has_next_page: window.end() < total,
            records,
        })
    }
}

#[async_trait]
impl CapabilityChecker for MemoryTracker {
    async fn can_browse(&self, caller: &Caller, project: &ProjectRef) -> bool {
        self.may_browse(caller, &project.key)
    }
}

#[async_trait]
impl ProjectResolver for MemoryTracker {
    async fn resolve(&self, project_key: &str) -> Option<ProjectRef> {
        self.project(project_key).map(|p| ProjectRef {
            id: p.id.clone(),
            key: p.key.clone(),
            name: p.name.clone(),
            restricted_view_id: p.restricted_view_id.clone(),
        })
    }

    async fn is_fallback_eligible(&self, project: &ProjectRef) -> bool {
        project.restricted_view_id.is_some()
    }
}
