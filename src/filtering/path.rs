//! Classification of field names into direct columns and relation paths.

use crate::errors::QueryError;
use crate::schema::{Cardinality, EntitySchema, RelationDef, SchemaRegistry};

const MAX_FIELD_NAME_LENGTH: usize = 100;

/// `relation.relation.column`, split into traversal steps and the final column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPath {
    pub hops: Vec<String>,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Direct(String),
    Relation(RelationPath),
}

/// One traversed relation together with the entity it lands on.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedHop<'a> {
    pub name: &'a str,
    pub relation: &'a RelationDef,
    pub target: &'a EntitySchema,
}

/// A field checked against the registry: every hop exists and the column is
/// declared on the last entity reached.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub root: &'a EntitySchema,
    pub hops: Vec<ResolvedHop<'a>>,
    pub column: String,
}

impl ResolvedField<'_> {
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.hops.is_empty()
    }

    /// Entity owning `column`.
    #[must_use]
    pub fn owner(&self) -> &EntitySchema {
        self.hops.last().map_or(self.root, |hop| hop.target)
    }

    /// The first hop whose relation may yield several rows.
    #[must_use]
    pub fn first_multi_valued_hop(&self) -> Option<&ResolvedHop<'_>> {
        self.hops
            .iter()
            .find(|hop| hop.relation.cardinality() == Cardinality::Many)
    }
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a field name. Only checks syntax; see [`resolve_field`] for metadata checks.
pub fn parse_field_path(field: &str) -> Result<FieldPath, QueryError> {
    let unknown = || QueryError::UnknownField {
        field: field.to_string(),
    };
    if field.len() > MAX_FIELD_NAME_LENGTH {
        return Err(unknown());
    }

    let mut segments: Vec<&str> = field.split('.').collect();
    if !segments.iter().all(|segment| is_identifier(segment)) {
        return Err(unknown());
    }

    let column = segments.pop().ok_or_else(unknown)?.to_string();
    if segments.is_empty() {
        return Ok(FieldPath::Direct(column));
    }
    Ok(FieldPath::Relation(RelationPath {
        hops: segments.into_iter().map(str::to_string).collect(),
        column,
    }))
}

/// Resolve `field` against the metadata of `root`, descending through each
/// related entity's own relations for multi-hop paths.
pub fn resolve_field<'a>(
    registry: &'a SchemaRegistry,
    root: &'a EntitySchema,
    field: &str,
    relation_paths: bool,
) -> Result<ResolvedField<'a>, QueryError> {
    let path = parse_field_path(field)?;
    let (hop_names, column) = match path {
        FieldPath::Direct(column) => (Vec::new(), column),
        FieldPath::Relation(_) if !relation_paths => {
            return Err(QueryError::UnknownField {
                field: field.to_string(),
            });
        }
        FieldPath::Relation(RelationPath { hops, column }) => (hops, column),
    };

    let mut current = root;
    let mut hops = Vec::with_capacity(hop_names.len());
    for name in &hop_names {
        let (relation_name, relation) = current
            .relation_entry(name)
            .ok_or_else(|| QueryError::UnknownRelation {
                relation: name.clone(),
                entity: current.name.clone(),
            })?;
        let target = registry
            .entity(&relation.target)
            .ok_or_else(|| QueryError::UnknownRelation {
                relation: name.clone(),
                entity: current.name.clone(),
            })?;
        hops.push(ResolvedHop {
            name: relation_name,
            relation,
            target,
        });
        current = target;
    }

    if !current.has_column(&column) {
        return Err(QueryError::UnknownField {
            field: field.to_string(),
        });
    }

    Ok(ResolvedField { root, hops, column })
}
