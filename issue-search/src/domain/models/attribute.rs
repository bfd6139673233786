use serde_json::Value;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

use crate::domain::AttributeError;

/// Accessor names tried, in order, on values of unknown shape.
pub const OPAQUE_ACCESSORS: [&str; 7] = [
    "name",
    "displayName",
    "label",
    "value",
    "key",
    "objectLabel",
    "objectKey",
];

/// Longest string an opaque value may be coerced to.
const MAX_COERCED_LEN: usize = 500;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A custom attribute value classified into one of the shapes we know how to
/// display.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Date(OffsetDateTime),
    /// A single select option.
    Option(String),
    /// A user picker; carries the display name.
    User(String),
    Label(String),
    Collection(Vec<AttributeValue>),
    Cascading {
        parent: Option<String>,
        child: Option<String>,
    },
    /// Anything else, kept as raw JSON.
    Opaque(Value),
}

/// A custom attribute enumerated for one record.
///
/// Classification may fail per attribute; such attributes are dropped from
/// the projected record without affecting the others.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    pub id: String,
    pub value: Result<AttributeValue, AttributeError>,
}

impl AttributeValue {
    /// Human-readable rendering. `Ok(None)` means "nothing worth showing".
    pub fn display_value(&self) -> Result<Option<String>, AttributeError> {
        match self {
            Self::Text(s) | Self::Option(s) | Self::User(s) | Self::Label(s) => {
                Ok(Some(s.clone()))
            }
            Self::Number(n) => {
                if !n.is_finite() {
                    return Err(AttributeError::Format(format!("non-finite number {n}")));
                }
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Ok(Some(format!("{}", *n as i64)))
                } else {
                    Ok(Some(n.to_string()))
                }
            }
            Self::Date(date) => date
                .format(DATE_FORMAT)
                .map(Some)
                .map_err(|e| AttributeError::Format(e.to_string())),
            Self::Collection(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(part) = item.display_value()?.filter(|p| !p.is_empty()) {
                        parts.push(part);
                    }
                }
                Ok((!parts.is_empty()).then(|| parts.join(", ")))
            }
            Self::Cascading { parent, child } => {
                let rendered = [parent.as_deref(), child.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" - ");
                Ok((!rendered.is_empty()).then_some(rendered))
            }
            Self::Opaque(value) => Ok(opaque_display_value(value)),
        }
    }
}

/// Bounded best-effort rendering of a value of unknown shape.
///
/// Tries each of [`OPAQUE_ACCESSORS`] on objects, then falls back to a plain
/// string coercion that is rejected when it looks like an identity dump
/// (contains `@`) or is too long.
pub fn opaque_display_value(value: &Value) -> Option<String> {
    if let Value::Object(map) = value {
        for accessor in OPAQUE_ACCESSORS {
            let candidate = match map.get(accessor) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => continue,
            };
            if !candidate.is_empty() && !candidate.contains('@') {
                return Some(candidate);
            }
        }
    }

    let coerced = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if coerced.contains('@') || coerced.len() >= MAX_COERCED_LEN {
        tracing::debug!(len = coerced.len(), "Could not extract display value from opaque attribute");
        return None;
    }
    Some(coerced)
}
