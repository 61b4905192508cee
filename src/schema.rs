//! Relation metadata registry.
//!
//! Every identifier the compiler renders into SQL comes from here: table names,
//! column names and the key columns used to correlate a related table back to
//! its parent. Request data is only ever *looked up* against this registry.
//!
//! ```rust,ignore
//! let registry = SchemaRegistry::new()
//!     .register(
//!         EntitySchema::for_entity::<user::Entity>("users")
//!             .relation("company", RelationDef::belongs_to("companies", "company_id", "id"))
//!             .relation("posts", RelationDef::has_many("posts", "user_id", "id")),
//!     )
//!     .register(EntitySchema::for_entity::<company::Entity>("companies"))
//!     .register(EntitySchema::for_entity::<post::Entity>("posts"));
//! ```

use sea_orm::{EntityTrait, IdenStatic, Iterable};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How many related rows a relation can yield per parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneOrZero,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The parent holds the foreign key (`users.company_id -> companies.id`).
    BelongsTo,
    /// The related table holds the foreign key, at most one row.
    HasOne,
    /// The related table holds the foreign key, any number of rows.
    HasMany,
    /// Linked through a pivot table.
    BelongsToMany,
}

impl RelationKind {
    #[must_use]
    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::BelongsTo | Self::HasOne => Cardinality::OneOrZero,
            Self::HasMany | Self::BelongsToMany => Cardinality::Many,
        }
    }
}

/// Pivot table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub table: String,
    /// Pivot column pointing at the parent's `local_key`.
    pub parent_key: String,
    /// Pivot column pointing at the related table's `foreign_key`.
    pub related_key: String,
}

/// Linkage between a parent entity and one of its relations.
///
/// Without a pivot the correlation is `related.foreign_key = parent.local_key`.
/// With a pivot it becomes `pivot.related_key = related.foreign_key` joined with
/// `pivot.parent_key = parent.local_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub kind: RelationKind,
    /// Registry name of the related entity.
    pub target: String,
    /// Column on the parent table.
    pub local_key: String,
    /// Column on the related table.
    pub foreign_key: String,
    pub pivot: Option<Pivot>,
}

impl RelationDef {
    /// `parent.<foreign_key_on_parent>` references `target.<owner_key>`.
    pub fn belongs_to(target: impl Into<String>, foreign_key_on_parent: impl Into<String>, owner_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            target: target.into(),
            local_key: foreign_key_on_parent.into(),
            foreign_key: owner_key.into(),
            pivot: None,
        }
    }

    /// `target.<foreign_key_on_related>` references `parent.<local_key>`.
    pub fn has_one(target: impl Into<String>, foreign_key_on_related: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasOne,
            target: target.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key_on_related.into(),
            pivot: None,
        }
    }

    pub fn has_many(target: impl Into<String>, foreign_key_on_related: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            ..Self::has_one(target, foreign_key_on_related, local_key)
        }
    }

    /// Many-to-many through `pivot_table`; both ends are keyed by `id` unless
    /// overridden with [`RelationDef::with_keys`].
    pub fn belongs_to_many(
        target: impl Into<String>,
        pivot_table: impl Into<String>,
        parent_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: RelationKind::BelongsToMany,
            target: target.into(),
            local_key: "id".to_string(),
            foreign_key: "id".to_string(),
            pivot: Some(Pivot {
                table: pivot_table.into(),
                parent_key: parent_pivot_key.into(),
                related_key: related_pivot_key.into(),
            }),
        }
    }

    #[must_use]
    pub fn with_keys(mut self, local_key: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        self.local_key = local_key.into();
        self.foreign_key = foreign_key.into();
        self
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }
}

/// Table name, declared columns and relations of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub table: String,
    columns: BTreeSet<String>,
    relations: BTreeMap<String, RelationDef>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: BTreeSet::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Seed table name and column list from a Sea-ORM entity.
    pub fn for_entity<E: EntityTrait>(name: impl Into<String>) -> Self {
        let entity = E::default();
        Self::new(name, entity.table_name()).columns(E::Column::iter().map(|column| column.as_str().to_owned()))
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.insert(column.into());
        self
    }

    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn relation(mut self, name: impl Into<String>, def: RelationDef) -> Self {
        self.relations.insert(name.into(), def);
        self
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    #[must_use]
    pub fn relation_def(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// Like [`EntitySchema::relation_def`], also borrowing the registered name.
    #[must_use]
    pub fn relation_entry(&self, name: &str) -> Option<(&str, &RelationDef)> {
        self.relations
            .get_key_value(name)
            .map(|(key, def)| (key.as_str(), def))
    }
}

/// Entity metadata keyed by registry name. Built once at startup and shared by
/// reference across requests.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, EntitySchema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, schema: EntitySchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&mut self, schema: EntitySchema) {
        if self.entities.contains_key(&schema.name) {
            tracing::warn!(entity = %schema.name, "Replacing registered entity schema");
        }
        self.entities.insert(schema.name.clone(), schema);
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }

    /// Relation targets that were never registered. Useful as a startup check.
    #[must_use]
    pub fn dangling_relations(&self) -> Vec<(String, String)> {
        let mut dangling: Vec<(String, String)> = self
            .entities
            .values()
            .flat_map(|schema| {
                schema
                    .relations
                    .iter()
                    .filter(|(_, def)| !self.entities.contains_key(&def.target))
                    .map(|(name, _)| (schema.name.clone(), name.clone()))
            })
            .collect();
        dangling.sort();
        dangling
    }
}
