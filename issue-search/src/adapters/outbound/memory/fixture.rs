use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::models::{Caller, RawIssue};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("project {0} is defined more than once")]
    DuplicateProject(String),
    #[error("issue {issue} belongs to unknown project {project}")]
    UnknownProject { issue: String, project: String },
}

/// A project known to the in-memory tracker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureProject {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub restricted_view_id: Option<String>,
    /// User keys allowed to browse the project.
    #[serde(default)]
    pub browsers: Vec<String>,
}

/// Tracker contents as stored on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub projects: Vec<FixtureProject>,
    pub users: Vec<Caller>,
    pub issues: Vec<RawIssue>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        let fixture: Self = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), FixtureError> {
        let mut keys = HashSet::new();
        for project in &self.projects {
            if !keys.insert(project.key.to_ascii_uppercase()) {
                return Err(FixtureError::DuplicateProject(project.key.clone()));
            }
        }

        for issue in &self.issues {
            if let Some(project) = &issue.project {
                if !keys.contains(&project.key.to_ascii_uppercase()) {
                    return Err(FixtureError::UnknownProject {
                        issue: issue.key.clone(),
                        project: project.key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_minimal_fixture() {
        let fixture = Fixture::from_json(
            &json!({
                "projects": [{ "id": "1", "key": "HELP", "name": "Help Desk" }],
                "issues": [{ "id": 1, "key": "HELP-1", "project": { "key": "HELP", "name": "Help Desk" } }]
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(fixture.projects[0].browsers, Vec::<String>::new());
        assert_eq!(fixture.issues[0].key, "HELP-1");
        assert!(fixture.users.is_empty());
    }

    #[test]
    fn rejects_issues_of_unknown_projects() {
        let err = Fixture::from_json(
            &json!({
                "issues": [{ "id": 1, "key": "OPS-1", "project": { "key": "OPS", "name": "Ops" } }]
            })
            .to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, FixtureError::UnknownProject { .. }));
    }

    #[test]
    fn rejects_duplicate_projects() {
        let project = json!({ "id": "1", "key": "HELP", "name": "Help Desk" });
        let err = Fixture::from_json(&json!({ "projects": [project.clone(), project] }).to_string())
            .unwrap_err();

        assert!(matches!(err, FixtureError::DuplicateProject(key) if key == "HELP"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Fixture::from_path("/definitely/not/here.json").unwrap_err();

        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
