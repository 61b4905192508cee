//! # tablequery
//!
//! Turns the lazy-load parameters of a PrimeNG-style data table (column
//! filters, a global search term, one sort field and pagination) into a
//! Sea-ORM query.
//!
//! Field names may traverse relations (`company.country.code`). Filters on
//! such paths compile to correlated `EXISTS` subqueries, so one root row stays
//! one result row no matter how many related rows match. Sorting through a
//! relation is allowed while every hop yields at most one row.
//!
//! Nothing from the request is rendered into SQL as text: identifiers come from
//! the [`SchemaRegistry`], values are bound parameters.
//!
//! ```rust,ignore
//! use tablequery::{QueryOptions, SchemaRegistry, TableQuery, apply_table_query, fetch_page};
//!
//! async fn list_users(
//!     State(state): State<AppState>,
//!     Query(params): Query<TableQuery>,
//! ) -> Result<ResultEnvelope<user::Model>, ApiError> {
//!     params.validate(&state.options)?;
//!     let composed = apply_table_query(user::Entity::find(), &state.registry, "users", &params, &state.options)?;
//!     Ok(fetch_page(&state.db, composed).await?)
//! }
//! ```

pub mod errors;
pub mod filtering;
pub mod models;
pub mod operations;
pub mod options;
pub mod schema;
pub mod validation;

pub use errors::{ApiError, QueryError};
pub use filtering::{FilterSpec, MatchMode, Pagination, SortDirection, SortSpec};
pub use models::{ResultEnvelope, TableQuery};
pub use operations::{ComposedQuery, apply_table_query, fetch_page};
pub use options::QueryOptions;
pub use schema::{Cardinality, EntitySchema, RelationDef, RelationKind, SchemaRegistry};
pub use validation::{ValidationError, ValidationErrors};
