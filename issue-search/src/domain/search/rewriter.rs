//! Rewrites a base filter expression into the augmented query that is
//! actually sent to the backend.
//!
//! Composition order is fixed: `(base) AND (search term) AND status IN (..)
//! AND priority IN (..) ORDER BY ..`. Every caller-supplied literal goes
//! through [`escape_literal`] so it can never close its quoted context.

use std::sync::LazyLock;

use regex::Regex;

use super::sort::NormalizedSort;
use crate::domain::models::SearchRequest;

static ORDER_BY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").unwrap());
static ISSUE_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+-\d+$").unwrap());

/// Request-time refinements layered on top of the base expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRefinements {
    pub search_term: Option<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
}

impl QueryRefinements {
    pub fn from_request(request: &SearchRequest) -> Self {
        Self {
            search_term: request
                .search_term
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            statuses: split_filter_list(request.status_filter.as_deref()),
            priorities: split_filter_list(request.priority_filter.as_deref()),
        }
    }

    /// The same refinements with the status and priority filters removed, so
    /// facets cover the full option space.
    pub fn without_attribute_filters(&self) -> Self {
        Self {
            search_term: self.search_term.clone(),
            statuses: Vec::new(),
            priorities: Vec::new(),
        }
    }
}

/// Escape a literal for use inside a quoted query string.
///
/// Backslashes are doubled first, then double and single quotes are
/// backslash-escaped.
pub fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
}

/// Split a base expression into the filter part and its trailing ordering
/// clause.
///
/// The rightmost `ORDER BY` (any case, any whitespace between the words) that
/// is not inside a quoted literal starts the ordering clause.
pub fn split_order_by(base: &str) -> (&str, Option<&str>) {
    let start = ORDER_BY_PATTERN
        .find_iter(base)
        .map(|m| m.start())
        .filter(|&start| !inside_quoted_literal(&base[..start]))
        .last();

    match start {
        Some(start) => {
            let order_by = base[start..].trim();
            (base[..start].trim(), Some(order_by))
        }
        None => (base.trim(), None),
    }
}

/// Build the augmented query.
///
/// A valid `sort` replaces the base ordering clause; otherwise the base
/// ordering clause is kept. Either way exactly one ordering clause is
/// emitted, last. If nothing composes, the base expression is returned
/// unchanged.
pub fn build_augmented_query(
    base: &str,
    refinements: &QueryRefinements,
    sort: Option<&NormalizedSort>,
) -> String {
    let (filter, base_order_by) = split_order_by(base);
    let mut clauses = Vec::with_capacity(4);

    if !filter.is_empty() {
        clauses.push(format!("({filter})"));
    }
    if let Some(term) = refinements.search_term.as_deref() {
        clauses.push(search_term_clause(term));
    }
    if let Some(clause) = membership_clause("status", &refinements.statuses) {
        clauses.push(clause);
    }
    if let Some(clause) = membership_clause("priority", &refinements.priorities) {
        clauses.push(clause);
    }

    let mut query = clauses.join(" AND ");
    let order_by = sort.map(NormalizedSort::order_by_clause);
    if let Some(order_by) = order_by.as_deref().or(base_order_by) {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(order_by);
    }

    let query = query.trim();
    if query.is_empty() {
        base.to_string()
    } else {
        query.to_string()
    }
}

/// Free-text clause. Terms shaped like an issue key also match the key
/// exactly.
fn search_term_clause(term: &str) -> String {
    let escaped = escape_literal(term);
    if ISSUE_KEY_PATTERN.is_match(term) {
        format!(
            "(key = \"{}\" OR summary ~ \"{escaped}\" OR description ~ \"{escaped}\")",
            escaped.to_uppercase()
        )
    } else {
        format!("(text ~ \"{escaped}\" OR key ~ \"{escaped}\")")
    }
}

fn membership_clause(field: &str, values: &[String]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let quoted = values
        .iter()
        .map(|v| format!("\"{}\"", escape_literal(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("{field} IN ({quoted})"))
}

fn split_filter_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Whether the end of `prefix` lies inside a quoted literal.
fn inside_quoted_literal(prefix: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = prefix.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            _ => {}
        }
    }
    quote.is_some()
}
