use sea_orm::Condition;
use serde_json::Value as Json;

use super::conditions::compile_resolved;
use super::parser::MatchMode;
use super::path::resolve_field;
use super::skip_or_fail;
use crate::errors::QueryError;
use crate::options::QueryOptions;
use crate::schema::{EntitySchema, SchemaRegistry};

/// Accepts the field list as a JSON-encoded array, a native array or a
/// comma-separated string. Blank names are dropped.
#[must_use]
pub fn parse_field_list(raw: &Json) -> Vec<String> {
    let names: Vec<String> = match raw {
        Json::Array(items) => items.iter().filter_map(Json::as_str).map(str::to_string).collect(),
        Json::String(encoded) => match serde_json::from_str::<Vec<String>>(encoded) {
            Ok(list) => list,
            Err(_) => encoded.split(',').map(str::to_string).collect(),
        },
        _ => Vec::new(),
    };
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// OR group of `contains` predicates, one per listed field.
///
/// The term is truncated to `options.max_global_filter_len` characters and
/// whitespace-only terms are ignored. Returns `None` when no field compiled.
pub fn build_global_search(
    registry: &SchemaRegistry,
    root: &EntitySchema,
    term: &str,
    fields: &[String],
    options: &QueryOptions,
    skipped: &mut Vec<QueryError>,
) -> Result<Option<Condition>, QueryError> {
    let term: String = term.chars().take(options.max_global_filter_len).collect();
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return Ok(None);
    }

    let value = Json::String(term.to_string());
    let mut condition = Condition::any();
    let mut compiled = 0_usize;
    for field in fields {
        let predicate = resolve_field(registry, root, field, options.relation_paths)
            .and_then(|resolved| compile_resolved(&resolved, field, MatchMode::Contains, &value));
        match predicate {
            Ok(expr) => {
                condition = condition.add(expr);
                compiled += 1;
            }
            Err(err) => skip_or_fail(err, options.strict, skipped)?,
        }
    }
    Ok((compiled > 0).then_some(condition))
}
