use std::collections::HashSet;

use serde_json::Value;
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

use crate::domain::{
    models::{AttributeValue, CustomAttribute, RawCustomField, RawIssue},
    ports::outbound::CustomAttributeSource,
    AttributeError,
};

/// Classifies stored custom field JSON by its type hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAttributeSource;

impl CustomAttributeSource for JsonAttributeSource {
    fn attributes(&self, issue: &RawIssue) -> Result<Vec<CustomAttribute>, AttributeError> {
        let mut seen = HashSet::new();
        let mut attributes = Vec::with_capacity(issue.custom_fields.len());

        for field in &issue.custom_fields {
            // Later copies fail on their own; the first one keeps its value.
            if !seen.insert(field.id.to_ascii_lowercase()) {
                attributes.push(CustomAttribute {
                    id: field.id.clone(),
                    value: Err(AttributeError::Duplicate {
                        id: field.id.clone(),
                    }),
                });
                continue;
            }
            if field.value.is_null() {
                continue;
            }
            attributes.push(CustomAttribute {
                id: field.id.clone(),
                value: classify(field),
            });
        }

        Ok(attributes)
    }
}

fn classify(field: &RawCustomField) -> Result<AttributeValue, AttributeError> {
    let malformed = |expected| AttributeError::Malformed {
        id: field.id.clone(),
        expected,
    };
    let value = &field.value;

    match field.type_key.as_deref().unwrap_or_default() {
        "text" | "textfield" | "textarea" | "url" => value
            .as_str()
            .map(|s| AttributeValue::Text(s.to_string()))
            .ok_or_else(|| malformed("text")),
        "float" | "number" => value
            .as_f64()
            .map(AttributeValue::Number)
            .ok_or_else(|| malformed("number")),
        "datepicker" | "datetime" => value
            .as_str()
            .and_then(parse_date)
            .map(AttributeValue::Date)
            .ok_or_else(|| malformed("date")),
        "select" | "radiobuttons" => option_name(value)
            .map(AttributeValue::Option)
            .ok_or_else(|| malformed("option")),
        "multiselect" | "multicheckboxes" => collect(value, |v| {
            option_name(v).map(AttributeValue::Option)
        })
        .ok_or_else(|| malformed("option list")),
        "userpicker" => user_name(value)
            .map(AttributeValue::User)
            .ok_or_else(|| malformed("user")),
        "multiuserpicker" => collect(value, |v| user_name(v).map(AttributeValue::User))
            .ok_or_else(|| malformed("user list")),
        "labels" => collect(value, |v| {
            v.as_str().map(|s| AttributeValue::Label(s.to_string()))
        })
        .ok_or_else(|| malformed("label list")),
        "cascadingselect" => {
            let Value::Object(map) = value else {
                return Err(malformed("cascading option"));
            };
            Ok(AttributeValue::Cascading {
                parent: map.get("value").and_then(Value::as_str).map(str::to_string),
                child: map.get("child").and_then(option_name),
            })
        }
        _ => Ok(AttributeValue::Opaque(value.clone())),
    }
}

fn parse_date(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok().or_else(|| {
        Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(|date| date.midnight().assume_utc())
    })
}

fn option_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn user_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ["displayName", "name", "key"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// All elements must classify, or the whole collection is malformed.
fn collect(
    value: &Value,
    item: impl Fn(&Value) -> Option<AttributeValue>,
) -> Option<AttributeValue> {
    value
        .as_array()?
        .iter()
        .map(item)
        .collect::<Option<Vec<_>>>()
        .map(AttributeValue::Collection)
}
