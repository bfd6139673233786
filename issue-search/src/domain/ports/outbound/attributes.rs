use crate::domain::{
    models::{CustomAttribute, RawIssue},
    AttributeError,
};

/// Outbound port enumerating the custom attributes of a record.
///
/// A source-level error drops all custom attributes of that record; errors
/// inside individual [`CustomAttribute`]s only drop that attribute.
pub trait CustomAttributeSource: Send + Sync + 'static {
    fn attributes(&self, issue: &RawIssue) -> Result<Vec<CustomAttribute>, AttributeError>;
}
