//! # Filtering, Search, Sorting & Pagination
//!
//! Translates PrimeNG table parameters into Sea-ORM conditions and ordering
//! without ever writing request text into SQL. Values are bound parameters;
//! identifiers must resolve against the [`SchemaRegistry`](crate::schema::SchemaRegistry).
//!
//! ## Main Components
//!
//! - [`parse_filters`]: decodes the `filters` payload into [`FilterSpec`]s
//! - [`resolve_field`]: direct column or `relation.column` path
//! - [`apply_filters`]: AND-combined predicates, relation paths wrapped in `EXISTS`
//! - [`build_global_search`]: one OR group of `contains` predicates
//! - [`compile_sort`]: direct column or correlated scalar subquery
//! - [`resolve_pagination`]: `first`/`rows` or `page`/`per_page`
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Field filters (JSON-encoded)
//! GET /users?filters={"status":{"value":"active","matchMode":"equals"},"age":{"value":18,"matchMode":"gte"}}
//!
//! // Filter through relations; one row per user even when several posts match
//! GET /users?filters={"posts.title":{"value":"rust","matchMode":"contains"}}
//!
//! // Global search across columns and relation columns
//! GET /users?globalFilter=john&globalFilterFields=["name","email","company.name"]
//!
//! // Sorting by a belongs-to column
//! GET /users?sortField=company.name&sortOrder=-1
//!
//! // Offset pagination (wins over page/per_page when both are sent)
//! GET /users?first=20&rows=10
//! ```

pub mod conditions;
pub mod pagination;
pub mod parser;
pub mod path;
pub mod search;
pub mod sort;

pub use conditions::{apply_filters, build_predicate, compile_filter};
pub use pagination::{PageRequest, Pagination, resolve_pagination};
pub use parser::{FilterSpec, GLOBAL_FIELD, MatchMode, ParsedFilters, parse_filter_str, parse_filters};
pub use path::{FieldPath, RelationPath, ResolvedField, ResolvedHop, parse_field_path, resolve_field};
pub use search::{build_global_search, parse_field_list};
pub use sort::{SortDirection, SortKey, SortSpec, compile_sort, parse_sort};

use crate::errors::QueryError;

/// Record a degradable error, or fail when strict mode is on or the error
/// concerns the whole payload.
pub(crate) fn skip_or_fail(
    err: QueryError,
    strict: bool,
    skipped: &mut Vec<QueryError>,
) -> Result<(), QueryError> {
    if strict || !err.is_degradable() {
        return Err(err);
    }
    tracing::debug!(field = ?err.field(), reason = %err, "Skipping table query input");
    skipped.push(err);
    Ok(())
}
