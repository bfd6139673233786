use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A backend-agnostic issue as returned to callers.
///
/// Optional sub-records are `None` when the issue simply does not have them
/// (no assignee, unresolved, no priority scheme, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub project: Option<IssueProject>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssueConstant>,
    pub issue_type: Option<IssueConstant>,
    pub resolution: Option<IssueResolution>,
    pub reporter: Option<IssuePerson>,
    pub assignee: Option<IssuePerson>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_at: Option<OffsetDateTime>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub fix_versions: Vec<String>,
    pub affected_versions: Vec<String>,
    pub time_tracking: TimeTracking,
    pub votes: Option<u32>,
    pub watchers: Option<u32>,
    /// Custom field id → display value.
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueProject {
    pub key: String,
    pub name: String,
    /// Restricted customer view id, when the owning project exposes one.
    pub restricted_view_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStatus {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
    pub category_key: Option<String>,
}

/// Priority and issue type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueConstant {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResolution {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved_at: Option<OffsetDateTime>,
}

/// A person attached to an issue (reporter, assignee).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePerson {
    pub key: String,
    pub display_name: String,
    pub email_address: Option<String>,
    pub avatar_url: Option<String>,
}

/// Time tracking figures in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTracking {
    pub original_estimate: Option<i64>,
    pub remaining_estimate: Option<i64>,
    pub time_spent: Option<i64>,
}
