//! Projection of raw backend records into [`IssueRecord`]s.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{
    models::{
        CustomAttribute, IssueConstant, IssuePerson, IssueProject, IssueRecord, IssueResolution,
        IssueStatus, RawConstant, RawIssue, RawUser, TimeTracking,
    },
    ports::outbound::CustomAttributeSource,
};

/// Project a raw record.
///
/// `restricted_views` maps project keys to the restricted view id of that
/// project, for projects that expose one.
pub fn to_issue_record(
    raw: RawIssue,
    attributes: &dyn CustomAttributeSource,
    restricted_views: &HashMap<String, String>,
) -> IssueRecord {
    let custom_fields = custom_field_values(&raw, attributes);

    let project = raw.project.map(|p| IssueProject {
        restricted_view_id: restricted_views.get(&p.key).cloned(),
        key: p.key,
        name: p.name,
    });

    let status = raw.status.map(|s| IssueStatus {
        id: s.id,
        name: s.name,
        icon_url: s.icon_url,
        category_key: s.category_key,
    });

    let resolved_at = raw.resolved;
    let resolution = raw.resolution.map(|r| IssueResolution {
        id: r.id,
        name: r.name,
        resolved_at,
    });

    IssueRecord {
        id: raw.id.to_string(),
        key: raw.key,
        summary: raw.summary.unwrap_or_default(),
        description: raw.description,
        environment: raw.environment,
        project,
        status,
        priority: raw.priority.map(to_constant),
        issue_type: raw.issue_type.map(to_constant),
        resolution,
        reporter: raw.reporter.map(to_person),
        assignee: raw.assignee.map(to_person),
        created_at: raw.created,
        updated_at: raw.updated,
        due_at: raw.due,
        labels: raw.labels,
        components: raw.components,
        fix_versions: raw.fix_versions,
        affected_versions: raw.affected_versions,
        time_tracking: TimeTracking {
            original_estimate: raw.original_estimate,
            remaining_estimate: raw.remaining_estimate,
            time_spent: raw.time_spent,
        },
        votes: raw.votes,
        watchers: raw.watches,
        custom_fields,
    }
}

fn to_constant(raw: RawConstant) -> IssueConstant {
    IssueConstant {
        id: raw.id,
        name: raw.name,
        icon_url: raw.icon_url,
    }
}

fn to_person(raw: RawUser) -> IssuePerson {
    IssuePerson {
        key: raw.key,
        display_name: raw.display_name,
        email_address: raw.email_address,
        avatar_url: raw.avatar_url,
    }
}

/// Display values of every custom attribute that renders cleanly.
fn custom_field_values(
    raw: &RawIssue,
    attributes: &dyn CustomAttributeSource,
) -> BTreeMap<String, String> {
    let enumerated = match attributes.attributes(raw) {
        Ok(enumerated) => enumerated,
        Err(e) => {
            tracing::debug!(issue_key = %raw.key, error = %e, "Error extracting custom fields");
            return BTreeMap::new();
        }
    };

    let mut values = BTreeMap::new();
    for CustomAttribute { id, value } in enumerated {
        match value.and_then(|v| v.display_value()) {
            Ok(Some(display)) => {
                values.insert(id, display);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(
                    issue_key = %raw.key,
                    field_id = %id,
                    error = %e,
                    "Skipping custom field without a display value"
                );
            }
        }
    }
    values
}
