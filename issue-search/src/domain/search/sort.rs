//! Allow-list validation of caller-supplied sort keys.
//!
//! Only a closed set of system fields and `customfield_<digits>` references
//! ever reach the ordering clause; everything else is dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use strum::{Display, EnumString};

use crate::domain::models::SortDirection;

static CUSTOM_FIELD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^customfield_(\d+)$").unwrap());

/// System fields a search may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum SystemField {
    Key,
    Summary,
    Status,
    Priority,
    Created,
    Updated,
    #[strum(serialize = "due", serialize = "duedate", to_string = "duedate")]
    Due,
    Assignee,
    Reporter,
    #[strum(serialize = "issuetype")]
    IssueType,
    Resolution,
}

/// A validated reference to an orderable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    System(SystemField),
    /// Custom attribute, by the digits of its `customfield_` id.
    Custom(String),
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System(field) => write!(f, "{field}"),
            Self::Custom(digits) => write!(f, "customfield_{digits}"),
        }
    }
}

/// A sort key and direction that are safe to splice into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl NormalizedSort {
    pub fn order_by_clause(&self) -> String {
        format!("ORDER BY {} {}", self.field, self.direction.as_keyword())
    }
}

/// Validate a raw sort key.
///
/// Accepts `customfield_<digits>` (any case) and the system field names
/// (any case, including the `issueType`/`dueDate` spellings used by UIs).
/// Anything else yields `None`.
pub fn normalize_sort_field(raw: Option<&str>) -> Option<SortField> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(caps) = CUSTOM_FIELD_PATTERN.captures(raw) {
        return Some(SortField::Custom(caps[1].to_string()));
    }

    SystemField::from_str(raw).ok().map(SortField::System)
}

/// Validate a raw sort key and direction together.
pub fn normalize_sort(field: Option<&str>, direction: Option<&str>) -> Option<NormalizedSort> {
    match normalize_sort_field(field) {
        Some(field) => Some(NormalizedSort {
            field,
            direction: SortDirection::parse(direction),
        }),
        None => {
            if let Some(raw) = field.filter(|f| !f.trim().is_empty()) {
                tracing::debug!(sort_field = %raw, "Ignoring unsupported sort field");
            }
            None
        }
    }
}
