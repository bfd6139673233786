//! Routing to a project's restricted view when the caller cannot browse it.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    executor::{run_page, PageOutcome, Projector},
    source::RestrictedPageSource,
};
use crate::domain::{
    models::{Caller, PageWindow, ProjectRef},
    ports::outbound::{CapabilityChecker, ProjectResolver, RestrictedViewBackend},
};

static PROJECT_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)project\s*=\s*"?([A-Z0-9_\-]+)"?"#).unwrap());

/// Best-effort extraction of the first `project = KEY` clause, upper-cased.
pub fn extract_project_key(query: &str) -> Option<String> {
    PROJECT_KEY_PATTERN
        .captures(query)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// Decides whether a search must be served by a restricted view, and runs it.
pub struct FallbackCoordinator<'a> {
    restricted: &'a dyn RestrictedViewBackend,
    capabilities: &'a dyn CapabilityChecker,
    projects: &'a dyn ProjectResolver,
}

impl<'a> FallbackCoordinator<'a> {
    pub fn new(
        restricted: &'a dyn RestrictedViewBackend,
        capabilities: &'a dyn CapabilityChecker,
        projects: &'a dyn ProjectResolver,
    ) -> Self {
        Self {
            restricted,
            capabilities,
            projects,
        }
    }

    /// The project whose restricted view should serve this search, if any.
    ///
    /// The target project comes from the caller's base query first and the
    /// backend-resolved query second. Fallback applies only when the caller
    /// cannot browse that project and the project exposes a restricted view.
    pub async fn target(
        &self,
        caller: &Caller,
        base_query: &str,
        resolved_query: Option<&str>,
    ) -> Option<ProjectRef> {
        let key = extract_project_key(base_query)
            .or_else(|| resolved_query.and_then(extract_project_key))?;

        let project = self.projects.resolve(&key).await?;
        if self.capabilities.can_browse(caller, &project).await {
            return None;
        }
        if !self.projects.is_fallback_eligible(&project).await {
            return None;
        }

        tracing::debug!(
            user_key = %caller.key,
            project_key = %project.key,
            "Caller cannot browse project; restricted view applies"
        );
        Some(project)
    }

    /// Run the restricted view for `project`.
    ///
    /// Any failure is logged and reported as `None`: the fallback path never
    /// fails the search.
    pub async fn run(
        &self,
        caller: &Caller,
        project: &ProjectRef,
        window: PageWindow,
        projector: &Projector<'_>,
    ) -> Option<PageOutcome> {
        let source = RestrictedPageSource::new(self.restricted, caller, project);
        match run_page(&source, window, projector).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(
                    project_key = %project.key,
                    error = %e,
                    "Restricted view fallback failed"
                );
                None
            }
        }
    }
}
