//! # Query Orchestration
//!
//! [`apply_table_query`] runs the compile pass over a Sea-ORM query in a fixed
//! order: column filters (AND), global search (one OR group), sort, then
//! pagination. It never touches the database, so any query implementing
//! `QueryFilter + QueryOrder` works, including ones the caller already narrowed.
//!
//! [`fetch_page`] is the async convenience on top: count before slicing, then
//! load the requested page.
//!
//! ```rust,ignore
//! let composed = apply_table_query(user::Entity::find(), &registry, "users", &params, &options)?;
//! let envelope = fetch_page(&db, composed).await?;
//! ```

use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::errors::QueryError;
use crate::filtering::{
    Pagination, apply_filters, build_global_search, compile_sort, parse_filters, resolve_pagination,
    skip_or_fail,
};
use crate::models::{ResultEnvelope, TableQuery};
use crate::options::QueryOptions;
use crate::schema::SchemaRegistry;

/// A query with every constraint applied, plus what the caller needs to slice
/// it and what was left out.
#[derive(Debug, Clone)]
pub struct ComposedQuery<Q> {
    pub query: Q,
    pub pagination: Pagination,
    /// Inputs skipped in tolerant mode, in encounter order.
    pub skipped: Vec<QueryError>,
}

/// Apply filters, global search and sort from `params` to `query`, and resolve
/// pagination.
///
/// `root` names the registered entity `query` selects from. Offset and limit
/// are not applied; see [`fetch_page`] or use [`Pagination::offset`] directly.
///
/// # Errors
///
/// - [`QueryError::UnknownEntity`] if `root` is not registered
/// - [`QueryError::InvalidFilterFormat`] if `filters` cannot be decoded
/// - in strict mode, the first filter, search field or sort that cannot be compiled
pub fn apply_table_query<Q>(
    mut query: Q,
    registry: &SchemaRegistry,
    root: &str,
    params: &TableQuery,
    options: &QueryOptions,
) -> Result<ComposedQuery<Q>, QueryError>
where
    Q: QueryFilter + QueryOrder,
{
    let schema = registry
        .entity(root)
        .ok_or_else(|| QueryError::UnknownEntity(root.to_string()))?;
    let mut skipped = Vec::new();

    if let Some(raw) = &params.filters {
        let parsed = parse_filters(raw)?;
        for rejected in parsed.rejected {
            skip_or_fail(rejected, options.strict, &mut skipped)?;
        }
        if let Some(condition) = apply_filters(registry, schema, &parsed.filters, options, &mut skipped)? {
            query = query.filter(condition);
        }
    }

    if let Some(term) = params.global_filter.as_deref() {
        let fields = params.global_filter_fields();
        if let Some(condition) = build_global_search(registry, schema, term, &fields, options, &mut skipped)? {
            query = query.filter(condition);
        }
    }

    if let Some(spec) = params.sort_spec() {
        match compile_sort(registry, schema, &spec, options.relation_paths) {
            Ok(key) => query = query.order_by(key.expr, key.order),
            Err(err) => skip_or_fail(err, options.strict, &mut skipped)?,
        }
    }

    let pagination = resolve_pagination(&params.page_request(), options);

    if !skipped.is_empty() {
        tracing::debug!(entity = %root, skipped = skipped.len(), "Table query compiled with skipped inputs");
    }

    Ok(ComposedQuery {
        query,
        pagination,
        skipped,
    })
}

/// Count the matching rows, then load the requested page.
pub async fn fetch_page<E, C>(
    db: &C,
    composed: ComposedQuery<Select<E>>,
) -> Result<ResultEnvelope<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let ComposedQuery {
        query, pagination, ..
    } = composed;

    let total = PaginatorTrait::count(query.clone(), db).await?;
    let data = query
        .offset(pagination.offset())
        .limit(pagination.per_page)
        .all(db)
        .await?;

    Ok(ResultEnvelope::new(data, total, pagination))
}
