use async_trait::async_trait;

use crate::domain::models::{Caller, ProjectRef};

/// Outbound port for the browse-permission check.
///
/// Implementations swallow their own failures and answer `false`.
#[async_trait]
pub trait CapabilityChecker: Send + Sync + 'static {
    async fn can_browse(&self, caller: &Caller, project: &ProjectRef) -> bool;
}

/// Outbound port for project lookup.
#[async_trait]
pub trait ProjectResolver: Send + Sync + 'static {
    /// Look up a project by key. Unknown keys resolve to `None`.
    async fn resolve(&self, project_key: &str) -> Option<ProjectRef>;

    /// Whether the project exposes a restricted view searches can fall back to.
    async fn is_fallback_eligible(&self, project: &ProjectRef) -> bool;
}
