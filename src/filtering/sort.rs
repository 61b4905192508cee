use sea_orm::sea_query::{Alias, JoinType, Order, Query, SimpleExpr, SubQueryStatement};
use serde_json::Value as Json;

use super::conditions::{column_ref, correlate, field_column, hop_alias};
use super::path::{ResolvedField, resolve_field};
use crate::errors::QueryError;
use crate::schema::{EntitySchema, SchemaRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// `asc`/`desc` in any case, or PrimeNG's `1`/`-1` as number or string.
    /// Anything else sorts ascending.
    #[must_use]
    pub fn parse(raw: &Json) -> Self {
        match raw {
            Json::Number(n) if n.as_i64() == Some(-1) => Self::Descending,
            Json::String(s) => Self::parse_str(s),
            _ => Self::Ascending,
        }
    }

    #[must_use]
    pub fn parse_str(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("desc") || raw == "-1" {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => Self::Asc,
            SortDirection::Descending => Self::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// No sort field means no ordering is requested.
#[must_use]
pub fn parse_sort(field: Option<&str>, order: Option<&Json>) -> Option<SortSpec> {
    let field = field.map(str::trim).filter(|f| !f.is_empty())?;
    Some(SortSpec {
        field: field.to_string(),
        direction: order.map(SortDirection::parse).unwrap_or_default(),
    })
}

/// Ordering expression ready for `QueryOrder::order_by`.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub expr: SimpleExpr,
    pub order: Order,
}

fn sort_invalid(field: &str, reason: impl Into<String>) -> QueryError {
    QueryError::SortTargetInvalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Scalar subquery selecting the related column for the current root row:
///
/// ```sql
/// (SELECT countries_2.name FROM companies AS companies_1
///     INNER JOIN countries AS countries_2 ON countries_2.id = companies_1.country_id
///     WHERE companies_1.id = users.company_id LIMIT 1)
/// ```
fn related_scalar(resolved: &ResolvedField<'_>) -> SimpleExpr {
    let aliases: Vec<String> = resolved
        .hops
        .iter()
        .enumerate()
        .map(|(index, hop)| hop_alias(hop, index + 1))
        .collect();

    let mut select = Query::select();
    select.expr(field_column(resolved));
    for (index, hop) in resolved.hops.iter().enumerate() {
        let alias = &aliases[index];
        if index == 0 {
            select.from_as(Alias::new(&hop.target.table), Alias::new(alias));
            correlate(&mut select, hop.relation, alias, &resolved.root.table);
        } else {
            select.join_as(
                JoinType::InnerJoin,
                Alias::new(&hop.target.table),
                Alias::new(alias),
                column_ref(alias, &hop.relation.foreign_key)
                    .equals((Alias::new(&aliases[index - 1]), Alias::new(&hop.relation.local_key))),
            );
        }
    }
    select.limit(1);

    SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(select)))
}

/// Compile the sort directive into an ordering key.
///
/// Relation paths are only sortable while every hop yields at most one row;
/// anything else (including paths that do not resolve) is `SortTargetInvalid`.
pub fn compile_sort(
    registry: &SchemaRegistry,
    root: &EntitySchema,
    spec: &SortSpec,
    relation_paths: bool,
) -> Result<SortKey, QueryError> {
    let resolved = resolve_field(registry, root, &spec.field, relation_paths)
        .map_err(|err| sort_invalid(&spec.field, err.to_string()))?;

    if let Some(hop) = resolved.first_multi_valued_hop() {
        return Err(sort_invalid(
            &spec.field,
            format!("relation '{}' may yield several rows", hop.name),
        ));
    }

    let expr = if resolved.is_direct() {
        field_column(&resolved).into()
    } else {
        related_scalar(&resolved)
    };
    Ok(SortKey {
        expr,
        order: spec.direction.into(),
    })
}
