use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::filtering::{PageRequest, Pagination, SortSpec, parse_field_list, parse_sort};

/// Lazy-load parameters sent by a PrimeNG data table.
///
/// # Filtering
/// `filters` is JSON, either keyed by field:
/// ```json
/// {"status": {"value": "active", "matchMode": "equals"}, "age": {"value": 18, "matchMode": "gte"}}
/// ```
/// or a list of records:
/// ```json
/// [{"field": "company.name", "operator": "contains", "value": "acme"}]
/// ```
/// Dotted fields traverse registered relations.
///
/// # Global search
/// `globalFilter` is matched (`contains`) against every field in
/// `globalFilterFields`, any match keeps the row.
///
/// # Pagination
/// Either `page`/`per_page` or PrimeNG's `first`/`rows`. The latter wins when
/// both are complete.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TableQuery {
    /// JSON-encoded column filters.
    #[param(value_type = Option<String>, example = json!({
        "status": {"value": "active", "matchMode": "equals"},
        "age": {"value": 18, "matchMode": "gte"}
    }))]
    pub filters: Option<Value>,
    /// Free text matched against `globalFilterFields`.
    #[serde(rename = "globalFilter")]
    #[param(example = "john")]
    pub global_filter: Option<String>,
    /// Fields searched by `globalFilter`, as a JSON array or comma-separated.
    #[serde(rename = "globalFilterFields")]
    #[param(value_type = Option<String>, example = r#"["name","email"]"#)]
    pub global_filter_fields: Option<Value>,
    /// Column or `relation.column` to sort by.
    #[serde(rename = "sortField")]
    #[param(example = "created_at")]
    pub sort_field: Option<String>,
    /// `asc`, `desc`, `1` or `-1`.
    #[serde(rename = "sortOrder")]
    #[param(value_type = Option<String>, example = "desc")]
    pub sort_order: Option<Value>,
    /// Page number (1-based).
    #[param(example = 1)]
    pub page: Option<i64>,
    #[param(example = 20)]
    pub per_page: Option<i64>,
    /// Offset of the first row.
    #[param(example = 0)]
    pub first: Option<i64>,
    /// Number of rows to return.
    #[param(example = 20)]
    pub rows: Option<i64>,
}

impl TableQuery {
    #[must_use]
    pub const fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            per_page: self.per_page,
            first: self.first,
            rows: self.rows,
        }
    }

    #[must_use]
    pub fn sort_spec(&self) -> Option<SortSpec> {
        parse_sort(self.sort_field.as_deref(), self.sort_order.as_ref())
    }

    #[must_use]
    pub fn global_filter_fields(&self) -> Vec<String> {
        self.global_filter_fields.as_ref().map(parse_field_list).unwrap_or_default()
    }
}

/// One page of rows plus the numbers a table needs for its paginator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResultEnvelope<T> {
    pub data: Vec<T>,
    /// Matching rows before pagination.
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> ResultEnvelope<T> {
    #[must_use]
    pub const fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        }
    }
}

impl<T: Serialize> IntoResponse for ResultEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
