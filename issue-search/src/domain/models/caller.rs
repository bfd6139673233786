use serde::{Deserialize, Serialize};

/// The authenticated identity a search runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub key: String,
    pub username: String,
    pub display_name: String,
}

impl Caller {
    pub fn new(
        key: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            username: username.into(),
            display_name: display_name.into(),
        }
    }
}
