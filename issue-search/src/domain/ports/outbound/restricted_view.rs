use async_trait::async_trait;

use crate::domain::{
    models::{Caller, PageWindow, ProjectRef, RawIssue},
    BackendError,
};

/// One page from the restricted view. There is no total, only a
/// has-next-page signal.
#[derive(Debug, Clone, Default)]
pub struct RestrictedPage {
    pub records: Vec<RawIssue>,
    pub has_next_page: bool,
}

/// Outbound port for the narrower, customer-facing request view of a project.
///
/// It applies its own visibility rule (typically: requests the caller raised
/// or participates in), independent of browse permission on the project.
#[async_trait]
pub trait RestrictedViewBackend: Send + Sync + 'static {
    async fn query(
        &self,
        caller: &Caller,
        project: &ProjectRef,
        window: PageWindow,
    ) -> Result<RestrictedPage, BackendError>;
}
