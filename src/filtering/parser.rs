//! Decoding of the raw `filters` payload.
//!
//! Two wire shapes are accepted, either JSON-encoded in a string parameter or
//! already structured:
//!
//! ```json
//! {"status": {"value": "active", "matchMode": "equals"}, "age": {"value": 18, "matchMode": "gte"}}
//! [{"field": "status", "operator": "equals", "value": "active"}]
//! ```

use serde_json::{Map, Value};
use std::fmt;

use crate::errors::QueryError;

/// Filter slot emitted by the table's global search box. Never compiled.
pub const GLOBAL_FIELD: &str = "global";

/// Supported comparison operators, named after PrimeNG's `FilterMatchMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Between,
    DateIs,
    DateIsNot,
    DateBefore,
    DateAfter,
}

impl MatchMode {
    pub const ALL: [Self; 17] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::In,
        Self::NotIn,
        Self::Between,
        Self::DateIs,
        Self::DateIsNot,
        Self::DateBefore,
        Self::DateAfter,
    ];

    /// Parse the wire name (`"equals"`, `"notContains"`, `"dateBefore"`, ...).
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_wire() == name)
    }

    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Between => "between",
            Self::DateIs => "dateIs",
            Self::DateIsNot => "dateIsNot",
            Self::DateBefore => "dateBefore",
            Self::DateAfter => "dateAfter",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One `(field, operator, value)` constraint. `value` is never null.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub field: String,
    pub operator: MatchMode,
    pub value: Value,
}

/// Result of decoding a payload: compilable filters plus the entries that were
/// rejected on the way (unknown operators).
#[derive(Debug, Default)]
pub struct ParsedFilters {
    pub filters: Vec<FilterSpec>,
    pub rejected: Vec<QueryError>,
}

impl ParsedFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Decode a JSON-encoded filter string.
pub fn parse_filter_str(raw: &str) -> Result<ParsedFilters, QueryError> {
    if raw.trim().is_empty() {
        return Ok(ParsedFilters::default());
    }
    let decoded: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, "Rejecting malformed filters payload");
        QueryError::InvalidFilterFormat(e.to_string())
    })?;
    match decoded {
        Value::String(_) => Err(QueryError::InvalidFilterFormat(
            "filters must decode to an object or a list".to_string(),
        )),
        other => parse_filters(&other),
    }
}

/// Decode a filter payload in any supported presentation.
pub fn parse_filters(raw: &Value) -> Result<ParsedFilters, QueryError> {
    match raw {
        Value::Null => Ok(ParsedFilters::default()),
        Value::String(encoded) => parse_filter_str(encoded),
        Value::Object(map) => Ok(parse_keyed(map)),
        Value::Array(records) => Ok(parse_records(records)),
        Value::Bool(_) | Value::Number(_) => Err(QueryError::InvalidFilterFormat(
            "filters must be an object or a list".to_string(),
        )),
    }
}

fn parse_keyed(map: &Map<String, Value>) -> ParsedFilters {
    let mut parsed = ParsedFilters::default();
    for (field, entry) in map {
        let Value::Object(entry) = entry else {
            tracing::debug!(field = %field, "Skipping filter entry that is not an object");
            continue;
        };
        push_entry(&mut parsed, field, entry.get("matchMode"), entry.get("value"));
    }
    parsed
}

fn parse_records(records: &[Value]) -> ParsedFilters {
    let mut parsed = ParsedFilters::default();
    for record in records {
        let Value::Object(record) = record else {
            tracing::debug!("Skipping filter record that is not an object");
            continue;
        };
        let Some(field) = record.get("field").and_then(Value::as_str) else {
            tracing::debug!("Skipping filter record without a field name");
            continue;
        };
        let operator = record.get("operator").or_else(|| record.get("matchMode"));
        push_entry(&mut parsed, field, operator, record.get("value"));
    }
    parsed
}

fn push_entry(parsed: &mut ParsedFilters, field: &str, operator: Option<&Value>, value: Option<&Value>) {
    if field.is_empty() || field == GLOBAL_FIELD {
        return;
    }
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return;
    };

    let operator = match operator {
        None | Some(Value::Null) => Ok(MatchMode::default()),
        Some(Value::String(name)) => MatchMode::from_wire(name).ok_or_else(|| name.clone()),
        Some(other) => Err(other.to_string()),
    };

    match operator {
        Ok(operator) => parsed.filters.push(FilterSpec {
            field: field.to_string(),
            operator,
            value: value.clone(),
        }),
        Err(operator) => {
            tracing::debug!(field = %field, operator = %operator, "Skipping filter with unsupported operator");
            parsed.rejected.push(QueryError::UnsupportedOperator {
                field: field.to_string(),
                operator,
            });
        }
    }
}

/// Null, empty strings and empty lists carry no constraint.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
