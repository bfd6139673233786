use thiserror::Error;

/// Errors surfaced to callers of the issue search service.
///
/// Everything else (fallback failures, facet failures, custom attribute
/// extraction failures) is downgraded inside the pipeline and never reaches
/// this type.
#[derive(Debug, Error)]
pub enum IssueSearchError {
    /// The backend rejected the query text.
    #[error("Invalid query: {}", diagnostics.join("; "))]
    InvalidQuery {
        query: String,
        diagnostics: Vec<String>,
    },
    #[error("Issue search failed: {0}")]
    Internal(String),
}

impl IssueSearchError {
    /// Map a backend failure for `query` to the caller-facing taxonomy.
    pub fn from_backend(query: &str, error: BackendError) -> Self {
        match error {
            BackendError::Rejected(diagnostics) => Self::InvalidQuery {
                query: query.to_string(),
                diagnostics,
            },
            BackendError::Unavailable(msg) => Self::Internal(msg),
        }
    }
}

/// Errors reported by outbound search collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the query; carries its diagnostics.
    #[error("query rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn rejected(diagnostic: impl Into<String>) -> Self {
        Self::Rejected(vec![diagnostic.into()])
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Failure to turn a single custom attribute into a display value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("attribute {id} has malformed {expected} value")]
    Malformed { id: String, expected: &'static str },
    #[error("attribute {id} appears more than once")]
    Duplicate { id: String },
    #[error("could not format attribute value: {0}")]
    Format(String),
    #[error("attribute source failed: {0}")]
    Source(String),
}
