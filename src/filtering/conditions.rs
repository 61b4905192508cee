use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sea_orm::{
    Condition, Value,
    sea_query::{Alias, Expr, Func, JoinType, LikeExpr, Query, SelectStatement, SimpleExpr},
};
use serde_json::Value as Json;

use super::parser::{FilterSpec, MatchMode};
use super::path::{ResolvedField, ResolvedHop, resolve_field};
use super::skip_or_fail;
use crate::errors::QueryError;
use crate::options::QueryOptions;
use crate::schema::{EntitySchema, RelationDef, SchemaRegistry};

// Basic safety limits
const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

/// Declared as `ESCAPE '!'` on every LIKE; portable across backends.
const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so user text only ever matches literally.
/// Escapes: ! (escape char), % (match any) and _ (match single char)
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone, Copy)]
enum Anchor {
    Anywhere,
    Prefix,
    Suffix,
}

fn like_pattern(text: &str, anchor: Anchor) -> LikeExpr {
    let escaped = escape_like_wildcards(text);
    let pattern = match anchor {
        Anchor::Anywhere => format!("%{escaped}%"),
        Anchor::Prefix => format!("{escaped}%"),
        Anchor::Suffix => format!("%{escaped}"),
    };
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

fn invalid(field: &str, reason: impl Into<String>) -> QueryError {
    QueryError::InvalidFilterValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn scalar_value(field: &str, value: &Json) -> Result<Value, QueryError> {
    match value {
        Json::String(s) if s.len() > MAX_FIELD_VALUE_LENGTH => Err(invalid(field, "value is too long")),
        Json::String(s) => Ok(s.clone().into()),
        Json::Bool(b) => Ok((*b).into()),
        Json::Number(n) => n
            .as_i64()
            .map(Value::from)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| n.as_f64().map(Value::from))
            .ok_or_else(|| invalid(field, "unrepresentable number")),
        Json::Null | Json::Array(_) | Json::Object(_) => Err(invalid(field, "expected a scalar value")),
    }
}

/// Text for substring operators; numbers and booleans match their textual form.
fn text_value(field: &str, value: &Json) -> Result<String, QueryError> {
    match value {
        Json::String(s) if s.len() > MAX_FIELD_VALUE_LENGTH => Err(invalid(field, "value is too long")),
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => Err(invalid(field, "expected a text value")),
    }
}

/// A scalar is treated as a one-element list.
fn list_values(field: &str, value: &Json) -> Result<Vec<Value>, QueryError> {
    let values = match value {
        Json::Array(items) => items
            .iter()
            .map(|item| scalar_value(field, item))
            .collect::<Result<Vec<_>, _>>()?,
        scalar => vec![scalar_value(field, scalar)?],
    };
    if values.is_empty() {
        return Err(invalid(field, "expected at least one value"));
    }
    Ok(values)
}

fn bounds(field: &str, value: &Json) -> Result<(Value, Value), QueryError> {
    match value {
        Json::Array(items) if items.len() == 2 => {
            Ok((scalar_value(field, &items[0])?, scalar_value(field, &items[1])?))
        }
        _ => Err(invalid(field, "between expects exactly two values")),
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM:SS`.
fn date_value(field: &str, value: &Json) -> Result<NaiveDate, QueryError> {
    let Json::String(raw) = value else {
        return Err(invalid(field, "expected a date string"));
    };
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .ok_or_else(|| invalid(field, format!("'{raw}' is not a date")))
}

fn date_of(column: Expr) -> Expr {
    Expr::expr(Func::cust(Alias::new("DATE")).arg(column))
}

/// Build the predicate for one operator against an already-qualified column.
///
/// `field` is only used for error reporting.
pub fn build_predicate(
    field: &str,
    column: Expr,
    operator: MatchMode,
    value: &Json,
) -> Result<SimpleExpr, QueryError> {
    let predicate = match operator {
        MatchMode::Equals => column.eq(scalar_value(field, value)?),
        MatchMode::NotEquals => column.ne(scalar_value(field, value)?),
        MatchMode::Contains => column.like(like_pattern(&text_value(field, value)?, Anchor::Anywhere)),
        MatchMode::NotContains => column.not_like(like_pattern(&text_value(field, value)?, Anchor::Anywhere)),
        MatchMode::StartsWith => column.like(like_pattern(&text_value(field, value)?, Anchor::Prefix)),
        MatchMode::EndsWith => column.like(like_pattern(&text_value(field, value)?, Anchor::Suffix)),
        MatchMode::Lt => column.lt(scalar_value(field, value)?),
        MatchMode::Lte => column.lte(scalar_value(field, value)?),
        MatchMode::Gt => column.gt(scalar_value(field, value)?),
        MatchMode::Gte => column.gte(scalar_value(field, value)?),
        MatchMode::In => column.is_in(list_values(field, value)?),
        MatchMode::NotIn => column.is_not_in(list_values(field, value)?),
        MatchMode::Between => {
            let (low, high) = bounds(field, value)?;
            column.between(low, high)
        }
        MatchMode::DateIs => date_of(column).eq(date_value(field, value)?),
        MatchMode::DateIsNot => date_of(column).ne(date_value(field, value)?),
        MatchMode::DateBefore => date_of(column).lt(date_value(field, value)?),
        MatchMode::DateAfter => date_of(column).gt(date_value(field, value)?),
    };
    Ok(predicate)
}

pub(crate) fn column_ref(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

/// Alias of the table reached by the hop at `depth` (1-based), unique within one chain.
pub(crate) fn hop_alias(hop: &ResolvedHop<'_>, depth: usize) -> String {
    format!("{}_{depth}", hop.target.table)
}

/// The qualified column a resolved field compiles to: the root table for direct
/// fields, the alias of the last hop for relation paths.
pub(crate) fn field_column(resolved: &ResolvedField<'_>) -> Expr {
    match resolved.hops.last() {
        None => column_ref(&resolved.root.table, &resolved.column),
        Some(last) => column_ref(&hop_alias(last, resolved.hops.len()), &resolved.column),
    }
}

/// Correlate `alias` (the related table) back to `parent`, joining through the
/// pivot table for many-to-many relations.
pub(crate) fn correlate(select: &mut SelectStatement, relation: &RelationDef, alias: &str, parent: &str) {
    match &relation.pivot {
        None => {
            select.and_where(
                column_ref(alias, &relation.foreign_key)
                    .equals((Alias::new(parent), Alias::new(&relation.local_key))),
            );
        }
        Some(pivot) => {
            let pivot_alias = format!("{alias}_pivot");
            select
                .join_as(
                    JoinType::InnerJoin,
                    Alias::new(&pivot.table),
                    Alias::new(&pivot_alias),
                    column_ref(&pivot_alias, &pivot.related_key)
                        .equals((Alias::new(alias), Alias::new(&relation.foreign_key))),
                )
                .and_where(
                    column_ref(&pivot_alias, &pivot.parent_key)
                        .equals((Alias::new(parent), Alias::new(&relation.local_key))),
                );
        }
    }
}

/// Wrap `predicate` (built on [`field_column`]) in one correlated `EXISTS` per
/// hop, innermost first:
///
/// ```sql
/// EXISTS (SELECT 1 FROM companies AS companies_1 WHERE companies_1.id = users.company_id
///     AND EXISTS (SELECT 1 FROM countries AS countries_2 WHERE countries_2.id = companies_1.country_id
///         AND countries_2.code = ?))
/// ```
pub(crate) fn related_exists(resolved: &ResolvedField<'_>, predicate: SimpleExpr) -> SimpleExpr {
    let aliases: Vec<String> = resolved
        .hops
        .iter()
        .enumerate()
        .map(|(index, hop)| hop_alias(hop, index + 1))
        .collect();

    let mut inner = predicate;
    for (index, hop) in resolved.hops.iter().enumerate().rev() {
        let parent = if index == 0 {
            resolved.root.table.as_str()
        } else {
            aliases[index - 1].as_str()
        };
        let mut subquery = Query::select();
        subquery
            .expr(Expr::val(1))
            .from_as(Alias::new(&hop.target.table), Alias::new(&aliases[index]));
        correlate(&mut subquery, hop.relation, &aliases[index], parent);
        subquery.and_where(inner);
        inner = Expr::exists(subquery);
    }
    inner
}

/// Compile an operator against a resolved field, direct or through relations.
pub(crate) fn compile_resolved(
    resolved: &ResolvedField<'_>,
    field: &str,
    operator: MatchMode,
    value: &Json,
) -> Result<SimpleExpr, QueryError> {
    let predicate = build_predicate(field, field_column(resolved), operator, value)?;
    if resolved.is_direct() {
        Ok(predicate)
    } else {
        Ok(related_exists(resolved, predicate))
    }
}

/// Compile one filter against the metadata of `root`.
pub fn compile_filter(
    registry: &SchemaRegistry,
    root: &EntitySchema,
    spec: &FilterSpec,
    relation_paths: bool,
) -> Result<SimpleExpr, QueryError> {
    let resolved = resolve_field(registry, root, &spec.field, relation_paths)?;
    compile_resolved(&resolved, &spec.field, spec.operator, &spec.value)
}

/// AND-combine every compilable filter. Returns `None` when nothing compiled.
///
/// Filters that fail to compile are recorded in `skipped`, or fail the call in
/// strict mode.
pub fn apply_filters(
    registry: &SchemaRegistry,
    root: &EntitySchema,
    filters: &[FilterSpec],
    options: &QueryOptions,
    skipped: &mut Vec<QueryError>,
) -> Result<Option<Condition>, QueryError> {
    let mut condition = Condition::all();
    let mut compiled = 0_usize;
    for spec in filters {
        match compile_filter(registry, root, spec, options.relation_paths) {
            Ok(expr) => {
                condition = condition.add(expr);
                compiled += 1;
            }
            Err(err) => skip_or_fail(err, options.strict, skipped)?,
        }
    }
    Ok((compiled > 0).then_some(condition))
}
