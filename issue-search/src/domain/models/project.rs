use serde::{Deserialize, Serialize};

/// A project as resolved by the project resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: String,
    pub key: String,
    pub name: String,
    /// Identifier of the restricted customer view, when the project exposes one.
    pub restricted_view_id: Option<String>,
}
