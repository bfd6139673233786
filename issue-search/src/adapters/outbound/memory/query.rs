//! A small filter-expression language evaluated against in-memory issues.
//!
//! Supports `AND`/`OR`/`NOT` with the usual precedence, parentheses, the
//! operators `= != ~ !~ < <= > >= IN, NOT IN, IS [NOT] EMPTY`, the
//! `currentUser()` function and a trailing `ORDER BY` clause. Unknown fields
//! and unsupported operators are collected as diagnostics and reject the
//! whole query.

use std::{cmp::Ordering, fmt, sync::LazyLock};

use regex::Regex;
use strum::{Display, EnumString};
use time::{macros::format_description, Date, OffsetDateTime, UtcOffset};

use crate::domain::{
    models::{opaque_display_value, Caller, RawIssue, SortDirection},
    ports::outbound::BackendQuery,
    search::rewriter::escape_literal,
    BackendError,
};

/// Deepest nesting of parentheses and `NOT` the parser accepts.
const MAX_NESTING: usize = 64;

static CUSTOM_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^customfield_(\d+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum SystemField {
    Project,
    Key,
    Summary,
    Description,
    Environment,
    Text,
    Status,
    Priority,
    #[strum(to_string = "issuetype", serialize = "type")]
    IssueType,
    Resolution,
    Assignee,
    Reporter,
    #[strum(to_string = "labels", serialize = "label")]
    Labels,
    #[strum(to_string = "component", serialize = "components")]
    Component,
    Created,
    Updated,
    #[strum(to_string = "duedate", serialize = "due")]
    Due,
    #[strum(to_string = "resolutiondate", serialize = "resolved")]
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    System(SystemField),
    /// Full id, e.g. `customfield_10010`
    Custom(String),
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        if let Some(caps) = CUSTOM_FIELD.captures(name) {
            return Some(Self::Custom(format!("customfield_{}", &caps[1])));
        }
        name.parse().ok().map(Self::System)
    }

    fn is_date(&self) -> bool {
        matches!(
            self,
            Self::System(
                SystemField::Created
                    | SystemField::Updated
                    | SystemField::Due
                    | SystemField::Resolved
            )
        )
    }

    fn supports(&self, op: Operator) -> bool {
        use Operator::*;
        let Self::System(field) = self else {
            return !matches!(op, Lt | LtEq | Gt | GtEq);
        };
        match field {
            SystemField::Summary
            | SystemField::Description
            | SystemField::Environment
            | SystemField::Text => matches!(op, Like | NotLike | Is | IsNot),
            SystemField::Key => matches!(op, Eq | NotEq | In | NotIn | Like),
            SystemField::Created
            | SystemField::Updated
            | SystemField::Due
            | SystemField::Resolved => !matches!(op, Like | NotLike | In | NotIn),
            _ => matches!(op, Eq | NotEq | In | NotIn | Is | IsNot),
        }
    }

    fn sortable(&self) -> bool {
        !matches!(self, Self::System(SystemField::Text))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System(field) => fmt::Display::fmt(field, f),
            Self::Custom(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Like,
    NotLike,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Like => "~",
            Self::NotLike => "!~",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Date(Date),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "\"{}\"", escape_literal(text)),
            Self::Date(date) => write!(f, "\"{date}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Single(Value),
    List(Vec<Value>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: Field,
    pub op: Operator,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Clause(Clause),
}

impl Expr {
    fn is_compound(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }

    pub fn matches(&self, issue: &RawIssue) -> bool {
        match self {
            Self::And(terms) => terms.iter().all(|t| t.matches(issue)),
            Self::Or(terms) => terms.iter().any(|t| t.matches(issue)),
            Self::Not(inner) => !inner.matches(issue),
            Self::Clause(clause) => clause.matches(issue),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, terms: &[Expr], sep: &str| -> fmt::Result {
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                if term.is_compound() {
                    write!(f, "({term})")?;
                } else {
                    write!(f, "{term}")?;
                }
            }
            Ok(())
        };

        match self {
            Self::And(terms) => join(f, terms, " AND "),
            Self::Or(terms) => join(f, terms, " OR "),
            Self::Not(inner) if inner.is_compound() => write!(f, "NOT ({inner})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Clause(clause) => write!(f, "{clause}"),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.field, self.op)?;
        match &self.operand {
            Operand::Single(value) => write!(f, "{value}"),
            Operand::List(values) => {
                let rendered = values.iter().map(Value::to_string).collect::<Vec<_>>();
                write!(f, "({})", rendered.join(", "))
            }
            Operand::Empty => f.write_str("EMPTY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub direction: SortDirection,
}

/// A parsed query, with `currentUser()` already resolved for the caller.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    pub filter: Option<Expr>,
    pub order_by: Vec<SortKey>,
}

impl MemoryQuery {
    pub fn matches(&self, issue: &RawIssue) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(issue))
    }

    /// Order issues by the `ORDER BY` keys, newest first when there are none.
    /// Ties fall back to ascending id.
    pub fn compare(&self, a: &RawIssue, b: &RawIssue) -> Ordering {
        let ordering = if self.order_by.is_empty() {
            compare_missing_last(a.created, b.created, SortDirection::Desc)
        } else {
            self.order_by
                .iter()
                .map(|key| compare_by(&key.field, key.direction, a, b))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        };
        ordering.then(a.id.cmp(&b.id))
    }
}

impl BackendQuery for MemoryQuery {
    fn resolved_text(&self) -> String {
        let mut text = self
            .filter
            .as_ref()
            .map(Expr::to_string)
            .unwrap_or_default();
        if !self.order_by.is_empty() {
            let keys = self
                .order_by
                .iter()
                .map(|key| format!("{} {}", key.field, key.direction.as_keyword()))
                .collect::<Vec<_>>();
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str("ORDER BY ");
            text.push_str(&keys.join(", "));
        }
        text
    }
}

/// Parse `query` on behalf of `caller`.
pub fn parse_query(caller: &Caller, query: &str) -> Result<MemoryQuery, BackendError> {
    let tokens = tokenize(query).map_err(BackendError::rejected)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        caller,
        diagnostics: Vec::new(),
    };

    let parsed = parser.parse().map_err(BackendError::rejected)?;
    if parser.diagnostics.is_empty() {
        Ok(parsed)
    } else {
        Err(BackendError::Rejected(parser.diagnostics))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    LParen,
    RParen,
    Comma,
    Op(Operator),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => f.write_str(word),
            Self::Quoted(text) => write!(f, "\"{text}\""),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Comma => f.write_str(","),
            Self::Op(op) => fmt::Display::fmt(op, f),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '*' | '@' | '/' | ':' | '+')
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '=' => Token::Op(Operator::Eq),
            '~' => Token::Op(Operator::Like),
            '!' => match chars.next() {
                Some((_, '=')) => Token::Op(Operator::NotEq),
                Some((_, '~')) => Token::Op(Operator::NotLike),
                _ => return Err(format!("Error in the query: expected '=' or '~' after '!' at position {pos}")),
            },
            '<' | '>' => {
                let or_equal = chars.next_if(|&(_, next)| next == '=').is_some();
                Token::Op(match (c, or_equal) {
                    ('<', false) => Operator::Lt,
                    ('<', true) => Operator::LtEq,
                    (_, false) => Operator::Gt,
                    (_, true) => Operator::GtEq,
                })
            }
            '"' | '\'' => {
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    match next {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                text.push(escaped);
                            }
                        }
                        q if q == c => {
                            closed = true;
                            break;
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(format!(
                        "Error in the query: unterminated string literal starting at position {pos}"
                    ));
                }
                Token::Quoted(text)
            }
            c if is_word_char(c) => {
                let mut word = c.to_string();
                while let Some((_, next)) = chars.next_if(|&(_, next)| is_word_char(next)) {
                    word.push(next);
                }
                Token::Word(word)
            }
            other => {
                return Err(format!(
                    "Error in the query: the character '{other}' at position {pos} is reserved"
                ))
            }
        };
        tokens.push((pos, token));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
    caller: &'a Caller,
    diagnostics: Vec<String>,
}

impl Parser<'_> {
    fn parse(&mut self) -> Result<MemoryQuery, String> {
        let filter = if self.at_end() || self.peek_keyword("ORDER") {
            None
        } else {
            Some(self.parse_or()?)
        };

        let mut order_by = Vec::new();
        if self.eat_keyword("ORDER") {
            if !self.eat_keyword("BY") {
                return Err(self.unexpected("'BY' after 'ORDER'"));
            }
            loop {
                order_by.push(self.parse_sort_key()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        if !self.at_end() {
            return Err(self.unexpected("the end of the query"));
        }
        Ok(MemoryQuery { filter, order_by })
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.parse_and()?];
        while self.eat_keyword("OR") {
            terms.push(self.parse_and()?);
        }
        Ok(collapse(terms, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.parse_not()?];
        while self.eat_keyword("AND") {
            terms.push(self.parse_not()?);
        }
        Ok(collapse(terms, Expr::And))
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if self.peek_keyword("NOT") || self.peek() == Some(&Token::LParen) {
            self.enter()?;
            let expr = self.parse_nested();
            self.depth -= 1;
            return expr;
        }
        self.parse_clause()
    }

    fn parse_nested(&mut self) -> Result<Expr, String> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.eat(&Token::LParen);
        let inner = self.parse_or()?;
        if !self.eat(&Token::RParen) {
            return Err(self.unexpected("')'"));
        }
        Ok(inner)
    }

    fn enter(&mut self) -> Result<(), String> {
        if self.depth >= MAX_NESTING {
            let pos = self.tokens.get(self.pos).map_or(0, |(pos, _)| *pos);
            return Err(format!(
                "Error in the query: nesting deeper than {MAX_NESTING} levels at position {pos}"
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_clause(&mut self) -> Result<Expr, String> {
        let name = self.expect_name("a field name")?;
        let op = self.parse_operator(&name)?;
        let operand = match op {
            Operator::In | Operator::NotIn => Operand::List(self.parse_list()?),
            Operator::Is | Operator::IsNot => {
                if !(self.eat_keyword("EMPTY") || self.eat_keyword("NULL")) {
                    return Err(self.unexpected("'EMPTY'"));
                }
                Operand::Empty
            }
            _ => Operand::Single(self.parse_value()?),
        };

        let Some(field) = Field::from_name(&name) else {
            self.diagnostics.push(format!(
                "Field '{name}' does not exist or you do not have permission to view it."
            ));
            // Matches nothing; the query is rejected once parsing finishes.
            return Ok(Expr::Or(Vec::new()));
        };
        if !field.supports(op) {
            self.diagnostics.push(format!(
                "The operator '{op}' is not supported by the '{field}' field."
            ));
        }

        let operand = if field.is_date() {
            self.to_dates(&field, operand)
        } else {
            operand
        };
        Ok(Expr::Clause(Clause { field, op, operand }))
    }

    fn parse_operator(&mut self, field: &str) -> Result<Operator, String> {
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            return Ok(op);
        }
        if self.eat_keyword("IN") {
            return Ok(Operator::In);
        }
        if self.eat_keyword("NOT") {
            if self.eat_keyword("IN") {
                return Ok(Operator::NotIn);
            }
            return Err(self.unexpected("'IN' after 'NOT'"));
        }
        if self.eat_keyword("IS") {
            return Ok(if self.eat_keyword("NOT") {
                Operator::IsNot
            } else {
                Operator::Is
            });
        }
        Err(self.unexpected(&format!("an operator after field '{field}'")))
    }

    fn parse_list(&mut self) -> Result<Vec<Value>, String> {
        if !self.eat(&Token::LParen) {
            return Err(self.unexpected("'('"));
        }
        let mut values = vec![self.parse_value()?];
        while self.eat(&Token::Comma) {
            values.push(self.parse_value()?);
        }
        if !self.eat(&Token::RParen) {
            return Err(self.unexpected("')'"));
        }
        Ok(values)
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        let word = match self.peek().cloned() {
            Some(Token::Quoted(text)) => {
                self.pos += 1;
                return Ok(Value::Text(text));
            }
            Some(Token::Word(word)) => {
                self.pos += 1;
                word
            }
            _ => return Err(self.unexpected("a value")),
        };

        if !self.eat(&Token::LParen) {
            return Ok(Value::Text(word));
        }
        if !self.eat(&Token::RParen) {
            return Err(self.unexpected("')'"));
        }
        if word.eq_ignore_ascii_case("currentUser") {
            Ok(Value::Text(self.caller.key.clone()))
        } else {
            self.diagnostics
                .push(format!("Unable to find function '{word}'."));
            Ok(Value::Text(String::new()))
        }
    }

    fn parse_sort_key(&mut self) -> Result<SortKey, String> {
        let name = self.expect_name("a field to order by")?;
        let direction = if self.eat_keyword("DESC") {
            SortDirection::Desc
        } else {
            self.eat_keyword("ASC");
            SortDirection::Asc
        };

        match Field::from_name(&name) {
            Some(field) if field.sortable() => Ok(SortKey { field, direction }),
            Some(field) => {
                self.diagnostics
                    .push(format!("Field '{field}' does not support sorting."));
                Ok(SortKey { field, direction })
            }
            None => {
                self.diagnostics.push(format!(
                    "Not able to sort using field '{name}'."
                ));
                Ok(SortKey {
                    field: Field::System(SystemField::Key),
                    direction,
                })
            }
        }
    }

    fn to_dates(&mut self, field: &Field, operand: Operand) -> Operand {
        let mut convert = |value: Value| match value {
            Value::Text(text) => match Date::parse(&text, format_description!("[year]-[month]-[day]")) {
                Ok(date) => Value::Date(date),
                Err(_) => {
                    self.diagnostics.push(format!(
                        "Date value '{text}' for field '{field}' is invalid. Valid format is 'yyyy-MM-dd'."
                    ));
                    Value::Text(text)
                }
            },
            date => date,
        };

        match operand {
            Operand::Single(value) => Operand::Single(convert(value)),
            Operand::List(values) => Operand::List(values.into_iter().map(convert).collect()),
            Operand::Empty => Operand::Empty,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String, String> {
        match self.peek().cloned() {
            Some(Token::Word(name)) | Some(Token::Quoted(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn unexpected(&self, expected: &str) -> String {
        match self.tokens.get(self.pos) {
            Some((pos, token)) => format!(
                "Error in the query: expected {expected} but found '{token}' at position {pos}"
            ),
            None => format!("Error in the query: expected {expected} but the query ended"),
        }
    }
}

fn collapse(mut terms: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        combine(terms)
    }
}

impl Clause {
    fn matches(&self, issue: &RawIssue) -> bool {
        if self.field.is_date() {
            return self.matches_date(date_of(&self.field, issue));
        }

        let values = text_values(&self.field, issue);
        let equals = |value: &Value| match value {
            Value::Text(text) => values.iter().any(|v| v.eq_ignore_ascii_case(text)),
            Value::Date(_) => false,
        };

        match (&self.op, &self.operand) {
            (Operator::Is, _) => values.is_empty(),
            (Operator::IsNot, _) => !values.is_empty(),
            (Operator::Eq, Operand::Single(value)) => equals(value),
            (Operator::NotEq, Operand::Single(value)) => !values.is_empty() && !equals(value),
            (Operator::In, Operand::List(list)) => list.iter().any(equals),
            (Operator::NotIn, Operand::List(list)) => {
                !values.is_empty() && !list.iter().any(equals)
            }
            (Operator::Like, Operand::Single(Value::Text(text))) => contains(&values, text),
            (Operator::NotLike, Operand::Single(Value::Text(text))) => !contains(&values, text),
            _ => false,
        }
    }

    fn matches_date(&self, actual: Option<Date>) -> bool {
        let compare = |value: &Value| match (actual, value) {
            (Some(actual), Value::Date(date)) => Some(actual.cmp(date)),
            _ => None,
        };

        match (&self.op, &self.operand) {
            (Operator::Is, _) => actual.is_none(),
            (Operator::IsNot, _) => actual.is_some(),
            (op, Operand::Single(value)) => compare(value).is_some_and(|ord| match op {
                Operator::Eq => ord.is_eq(),
                Operator::NotEq => ord.is_ne(),
                Operator::Lt => ord.is_lt(),
                Operator::LtEq => ord.is_le(),
                Operator::Gt => ord.is_gt(),
                Operator::GtEq => ord.is_ge(),
                _ => false,
            }),
            _ => false,
        }
    }
}

fn contains(values: &[String], needle: &str) -> bool {
    let needle = needle.trim_matches('*').to_lowercase();
    values.iter().any(|v| v.to_lowercase().contains(&needle))
}

fn text_values(field: &Field, issue: &RawIssue) -> Vec<String> {
    let field = match field {
        Field::Custom(id) => {
            return issue
                .custom_fields
                .iter()
                .filter(|cf| cf.id.eq_ignore_ascii_case(id))
                .filter_map(|cf| opaque_display_value(&cf.value))
                .collect();
        }
        Field::System(field) => field,
    };

    let mut values = Vec::new();
    let mut push = |value: Option<&String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            values.push(value.clone());
        }
    };

    match field {
        SystemField::Project => {
            if let Some(project) = &issue.project {
                push(Some(&project.key));
                push(Some(&project.name));
            }
        }
        SystemField::Key => push(Some(&issue.key)),
        SystemField::Summary => push(issue.summary.as_ref()),
        SystemField::Description => push(issue.description.as_ref()),
        SystemField::Environment => push(issue.environment.as_ref()),
        SystemField::Text => {
            push(issue.summary.as_ref());
            push(issue.description.as_ref());
            push(issue.environment.as_ref());
        }
        SystemField::Status => push(issue.status.as_ref().map(|s| &s.name)),
        SystemField::Priority => push(issue.priority.as_ref().map(|p| &p.name)),
        SystemField::IssueType => push(issue.issue_type.as_ref().map(|t| &t.name)),
        SystemField::Resolution => push(issue.resolution.as_ref().map(|r| &r.name)),
        SystemField::Assignee | SystemField::Reporter => {
            let user = if *field == SystemField::Assignee {
                &issue.assignee
            } else {
                &issue.reporter
            };
            if let Some(user) = user {
                push(Some(&user.key));
                push(Some(&user.display_name));
                push(user.email_address.as_ref());
            }
        }
        SystemField::Labels => issue.labels.iter().for_each(|l| push(Some(l))),
        SystemField::Component => issue.components.iter().for_each(|c| push(Some(c))),
        SystemField::Created | SystemField::Updated | SystemField::Due | SystemField::Resolved => {}
    }
    values
}

fn datetime_of(field: &Field, issue: &RawIssue) -> Option<OffsetDateTime> {
    match field {
        Field::System(SystemField::Created) => issue.created,
        Field::System(SystemField::Updated) => issue.updated,
        Field::System(SystemField::Due) => issue.due,
        Field::System(SystemField::Resolved) => issue.resolved,
        _ => None,
    }
}

fn date_of(field: &Field, issue: &RawIssue) -> Option<Date> {
    datetime_of(field, issue).map(|dt| dt.to_offset(UtcOffset::UTC).date())
}

/// Missing values sort last in either direction.
fn compare_missing_last<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.cmp(&b),
            SortDirection::Desc => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `HELP-9` sorts before `HELP-10`.
fn key_order(key: &str) -> (String, u64) {
    match key.rsplit_once('-') {
        Some((prefix, number)) => (prefix.to_ascii_uppercase(), number.parse().unwrap_or(0)),
        None => (key.to_ascii_uppercase(), 0),
    }
}

fn compare_by(field: &Field, direction: SortDirection, a: &RawIssue, b: &RawIssue) -> Ordering {
    if field.is_date() {
        return compare_missing_last(datetime_of(field, a), datetime_of(field, b), direction);
    }
    if *field == Field::System(SystemField::Key) {
        return compare_missing_last(Some(key_order(&a.key)), Some(key_order(&b.key)), direction);
    }
    let first = |issue: &RawIssue| {
        text_values(field, issue)
            .into_iter()
            .next()
            .map(|v| v.to_lowercase())
    };
    compare_missing_last(first(a), first(b), direction)
}
