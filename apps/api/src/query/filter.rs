//! Typed filter grammar built from request query parameters.
//!
//! Keys follow the bracket convention used by form encoders: `salary[gte]=50000`,
//! `a[b][lt]=3`. A trailing `gt`/`gte`/`lt`/`lte` segment is a comparison
//! operator; every other segment is part of the field path. The parsed
//! [`Filter`] is immutable and can be rendered as a document-store filter
//! ([`Filter::to_document`]), as SQL (see `query::sql`), or evaluated directly
//! against in-memory records ([`Filter::matches`]).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::instant::parse_instant;
use crate::models::application::ApplicationStatus;

/// Query keys that drive pagination and never become filter clauses.
pub const PAGINATION_KEYS: &[&str] = &["page", "limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gt" => Some(CmpOp::Gt),
            "gte" => Some(CmpOp::Gte),
            "lt" => Some(CmpOp::Lt),
            "lte" => Some(CmpOp::Lte),
            _ => None,
        }
    }

    /// Operator key in document-store syntax.
    pub fn document_key(&self) -> &'static str {
        match self {
            CmpOp::Gt => "$gt",
            CmpOp::Gte => "$gte",
            CmpOp::Lt => "$lt",
            CmpOp::Lte => "$lte",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Gte => ordering != Ordering::Less,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Timestamp,
    Boolean,
    Uuid,
    /// A set of strings; equality means membership.
    TextSet,
    /// An application status, stored in its canonical spelling.
    Status,
}

impl FieldKind {
    fn is_ordered(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Integer | FieldKind::Timestamp)
    }
}

/// A filterable field of some resource.
pub trait FilterField: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Resolves a field path (`["salary"]`) to a field, if the resource has one.
    fn resolve(path: &[String]) -> Option<Self>;
    /// Public (request/response) name of the field.
    fn name(&self) -> &'static str;
    /// Column backing the field in SQL.
    fn column(&self) -> &'static str;
    fn kind(&self) -> FieldKind;
    /// Whether a plain `field=value` means case-insensitive substring search.
    fn is_text_search(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    Uuid(Uuid),
}

impl Scalar {
    fn to_json(&self) -> Value {
        match self {
            Scalar::Text(v) => json!(v),
            Scalar::Integer(v) => json!(v),
            Scalar::Timestamp(v) => json!(v.to_rfc3339()),
            Scalar::Boolean(v) => json!(v),
            Scalar::Uuid(v) => json!(v.to_string()),
        }
    }

    fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Integer(a), Scalar::Integer(b)) => Some(a.cmp(b)),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => Some(a.cmp(b)),
            (Scalar::Uuid(a), Scalar::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Scalar),
    In(Vec<Scalar>),
    /// Case-insensitive literal substring match.
    Contains(String),
    Compare(Vec<(CmpOp, Scalar)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause<F> {
    pub field: F,
    pub predicate: Predicate,
}

/// The value a record holds for a field, as seen by [`Filter::matches`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Scalar(Scalar),
    Set(Vec<String>),
}

/// Records that can be evaluated against a `Filter<F>`.
pub trait Filterable<F> {
    fn value_of(&self, field: F) -> FieldValue;
}

/// A conjunction of clauses over the fields `F`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<F> {
    clauses: Vec<Clause<F>>,
}

impl<F> Default for Filter<F> {
    fn default() -> Self {
        Filter { clauses: Vec::new() }
    }
}

#[derive(Default)]
struct Group {
    path: Vec<String>,
    values: Vec<String>,
    comparisons: Vec<(CmpOp, String)>,
}

impl<F: FilterField> Filter<F> {
    /// Builds a filter from raw `key=value` query pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let mut groups: Vec<Group> = Vec::new();

        for (key, value) in pairs {
            let segments = split_key(key)?;
            if segments.len() == 1 && PAGINATION_KEYS.contains(&segments[0].as_str()) {
                continue;
            }

            let (path, op) = match segments.split_last() {
                Some((last, rest)) if !rest.is_empty() => match CmpOp::from_keyword(last) {
                    Some(op) => (rest.to_vec(), Some(op)),
                    None => (segments.clone(), None),
                },
                _ => (segments.clone(), None),
            };

            let group = match groups.iter().position(|g| g.path == path) {
                Some(idx) => &mut groups[idx],
                None => {
                    groups.push(Group {
                        path,
                        ..Group::default()
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            match op {
                Some(op) => group.comparisons.push((op, value.clone())),
                None => group.values.push(value.clone()),
            }
        }

        let clauses = groups
            .into_iter()
            .map(build_clause::<F>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Filter { clauses })
    }

    pub fn clauses(&self) -> &[Clause<F>] {
        &self.clauses
    }

    /// Renders the filter in document-store syntax, e.g. `{"salary": {"$gte": 50000}}`.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for clause in &self.clauses {
            let rendered = match &clause.predicate {
                Predicate::Eq(s) => s.to_json(),
                Predicate::In(values) => {
                    json!({ "$in": values.iter().map(Scalar::to_json).collect::<Vec<_>>() })
                }
                Predicate::Contains(needle) => {
                    json!({ "$regex": escape_regex(needle), "$options": "i" })
                }
                Predicate::Compare(ops) => {
                    let mut inner = Map::new();
                    for (op, s) in ops {
                        inner.insert(op.document_key().to_string(), s.to_json());
                    }
                    Value::Object(inner)
                }
            };
            doc.insert(clause.field.name().to_string(), rendered);
        }
        Value::Object(doc)
    }

    /// Evaluates the filter against an in-memory record.
    pub fn matches<T: Filterable<F>>(&self, record: &T) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause_matches(&clause.predicate, &record.value_of(clause.field)))
    }
}

fn clause_matches(predicate: &Predicate, value: &FieldValue) -> bool {
    match (predicate, value) {
        (_, FieldValue::Missing) => false,
        (Predicate::Eq(expected), FieldValue::Scalar(actual)) => expected == actual,
        (Predicate::Eq(Scalar::Text(expected)), FieldValue::Set(items)) => items.contains(expected),
        (Predicate::In(options), FieldValue::Scalar(actual)) => options.contains(actual),
        (Predicate::In(options), FieldValue::Set(items)) => options.iter().any(|o| match o {
            Scalar::Text(t) => items.contains(t),
            _ => false,
        }),
        (Predicate::Contains(needle), FieldValue::Scalar(Scalar::Text(haystack))) => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        (Predicate::Compare(ops), FieldValue::Scalar(actual)) => ops.iter().all(|(op, bound)| {
            actual
                .compare(bound)
                .map(|ordering| op.holds(ordering))
                .unwrap_or(false)
        }),
        _ => false,
    }
}

fn build_clause<F: FilterField>(group: Group) -> Result<Clause<F>, AppError> {
    let dotted = group.path.join(".");
    let field = F::resolve(&group.path)
        .ok_or_else(|| AppError::Validation(format!("Unknown filter field '{dotted}'")))?;

    if !group.values.is_empty() && !group.comparisons.is_empty() {
        return Err(AppError::Validation(format!(
            "Filter field '{dotted}' cannot combine equality and range conditions"
        )));
    }

    let predicate = if !group.comparisons.is_empty() {
        if !field.kind().is_ordered() {
            return Err(AppError::Validation(format!(
                "Filter field '{dotted}' does not support range comparisons"
            )));
        }
        let ops = group
            .comparisons
            .iter()
            .map(|(op, raw)| coerce(field, raw).map(|s| (*op, s)))
            .collect::<Result<Vec<_>, _>>()?;
        Predicate::Compare(ops)
    } else if field.is_text_search() {
        match group.values.as_slice() {
            [needle] => Predicate::Contains(needle.clone()),
            _ => {
                return Err(AppError::Validation(format!(
                    "Filter field '{dotted}' accepts a single search term"
                )))
            }
        }
    } else {
        let mut scalars = group
            .values
            .iter()
            .map(|raw| coerce(field, raw))
            .collect::<Result<Vec<_>, _>>()?;
        if scalars.len() == 1 {
            Predicate::Eq(scalars.remove(0))
        } else {
            Predicate::In(scalars)
        }
    };

    Ok(Clause { field, predicate })
}

fn coerce<F: FilterField>(field: F, raw: &str) -> Result<Scalar, AppError> {
    let invalid = |expected: &str| {
        AppError::Validation(format!(
            "Filter value '{raw}' for '{}' is not a valid {expected}",
            field.name()
        ))
    };
    match field.kind() {
        FieldKind::Text | FieldKind::TextSet => Ok(Scalar::Text(raw.to_string())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|_| invalid("integer")),
        FieldKind::Timestamp => parse_instant(raw)
            .map(Scalar::Timestamp)
            .ok_or_else(|| invalid("date")),
        FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Scalar::Boolean(true)),
            "false" | "0" => Ok(Scalar::Boolean(false)),
            _ => Err(invalid("boolean")),
        },
        FieldKind::Status => raw
            .parse::<ApplicationStatus>()
            .map(|status| Scalar::Text(status.as_str().to_string())),
        FieldKind::Uuid => Uuid::parse_str(raw.trim())
            .map(Scalar::Uuid)
            .map_err(|_| invalid("id")),
    }
}

/// Splits `a[b][c]` into `["a", "b", "c"]`.
fn split_key(key: &str) -> Result<Vec<String>, AppError> {
    let malformed = || AppError::Validation(format!("Malformed filter key '{key}'"));

    let (root, mut rest) = match key.find('[') {
        Some(idx) => (&key[..idx], &key[idx..]),
        None => (key, ""),
    };
    if root.is_empty() {
        return Err(malformed());
    }

    let mut segments = vec![root.to_string()];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        let segment = &inner[..close];
        if segment.is_empty() || segment.contains('[') {
            return Err(malformed());
        }
        segments.push(segment.to_string());
        rest = &inner[close + 1..];
    }
    Ok(segments)
}

fn escape_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
