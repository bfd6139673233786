use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// An issue as handed over by a search backend, before projection.
///
/// Every sub-object is optional; backends omit what an issue does not have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIssue {
    pub id: u64,
    pub key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub project: Option<RawProject>,
    pub status: Option<RawStatus>,
    pub priority: Option<RawConstant>,
    pub issue_type: Option<RawConstant>,
    pub resolution: Option<RawConstant>,
    pub reporter: Option<RawUser>,
    pub assignee: Option<RawUser>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved: Option<OffsetDateTime>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub fix_versions: Vec<String>,
    pub affected_versions: Vec<String>,
    /// Seconds
    pub original_estimate: Option<i64>,
    /// Seconds
    pub remaining_estimate: Option<i64>,
    /// Seconds
    pub time_spent: Option<i64>,
    pub votes: Option<u32>,
    pub watches: Option<u32>,
    pub custom_fields: Vec<RawCustomField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProject {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatus {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
    pub category_key: Option<String>,
}

/// Priority, issue type and resolution share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConstant {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub key: String,
    pub display_name: String,
    pub email_address: Option<String>,
    pub avatar_url: Option<String>,
}

/// A custom field value as stored by the backend.
///
/// `type_key` is the backend's field type hint (e.g. `"select"`, `"datepicker"`);
/// the value itself is untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCustomField {
    pub id: String,
    #[serde(default)]
    pub type_key: Option<String>,
    pub value: Value,
}
