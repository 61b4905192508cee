#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use tablequery::{EntitySchema, RelationDef, SchemaRegistry};

pub mod entities;

use entities::{company, country, post, post_tag, profile, tag, user};

pub const USER_COUNT: i32 = 100;

const FIRST_NAMES: [&str; 10] = [
    "John", "Alice", "Johnny", "Bob", "Maria", "Johanna", "Zoë", "Carlos", "Ann", "Mike",
];
const SURNAMES: [&str; 7] = ["Smith", "Johnson", "Müller", "O'Brien", "Lee", "Garcia", "Rossi"];

/// Honour `RUST_LOG` when debugging a test run.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Deterministic fixture of [`USER_COUNT`] users. Creation times are distinct
/// and increase with the id, seven hours apart.
pub fn user_rows() -> Vec<user::Model> {
    (1..=USER_COUNT)
        .map(|id| {
            let index = usize::try_from(id).unwrap();
            let email = if id % 13 == 0 {
                format!("john.{id}@example.com")
            } else {
                format!("user{id}@example.com")
            };
            user::Model {
                id,
                name: format!("{} {}", FIRST_NAMES[index % FIRST_NAMES.len()], SURNAMES[index % SURNAMES.len()]),
                email,
                status: if id % 3 == 0 { "inactive" } else { "active" }.to_string(),
                age: 10 + (id * 7) % 60,
                created_at: base_time() + Duration::hours(i64::from(id) * 7),
                company_id: (id % 10 != 0).then_some(id % 4 + 1),
            }
        })
        .collect()
}

pub fn company_rows() -> Vec<company::Model> {
    [(1, "Acme", 1), (2, "Globex", 2), (3, "Initech", 1), (4, "Umbrella 50%", 3)]
        .into_iter()
        .map(|(id, name, country_id)| company::Model {
            id,
            name: name.to_string(),
            country_id,
        })
        .collect()
}

pub fn country_rows() -> Vec<country::Model> {
    [(1, "CH", "Switzerland"), (2, "DE", "Germany"), (3, "JP", "Japan")]
        .into_iter()
        .map(|(id, code, name)| country::Model {
            id,
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn profile_rows() -> Vec<profile::Model> {
    [(1, 1, "Mongoose"), (2, 2, "Aardvark"), (3, 3, "Zebra"), (4, 4, "Lynx")]
        .into_iter()
        .map(|(id, user_id, bio)| profile::Model {
            id,
            user_id,
            bio: bio.to_string(),
        })
        .collect()
}

/// Titles cover empty text, non-ASCII text and LIKE/SQL metacharacters.
pub const POST_TITLES: [(i32, i32, &str); 12] = [
    (1, 1, "Learning Rust"),
    (2, 1, "Rust ownership"),
    (3, 1, "Cooking pasta"),
    (4, 2, "Rust async"),
    (5, 3, ""),
    (6, 3, "100% pure_text"),
    (7, 4, "Ünïcödé títlé"),
    (8, 4, "O'Brien's \"quote\"; DROP TABLE posts; --"),
    (9, 5, "back\\slash and wow!"),
    (10, 5, "1000 points"),
    (11, 6, "under_score"),
    (12, 6, "日本語のタイトル"),
];

pub fn post_rows() -> Vec<post::Model> {
    POST_TITLES
        .into_iter()
        .map(|(id, user_id, title)| post::Model {
            id,
            user_id,
            title: title.to_string(),
        })
        .collect()
}

pub fn tag_rows() -> Vec<tag::Model> {
    [(1, "rust"), (2, "food"), (3, "misc")]
        .into_iter()
        .map(|(id, label)| tag::Model {
            id,
            label: label.to_string(),
        })
        .collect()
}

pub fn post_tag_rows() -> Vec<post_tag::Model> {
    [(1, 1), (2, 1), (4, 1), (3, 2), (3, 3), (6, 3)]
        .into_iter()
        .map(|(post_id, tag_id)| post_tag::Model { post_id, tag_id })
        .collect()
}

/// Relation metadata for the fixture tables, registered under their table names.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .register(
            EntitySchema::for_entity::<user::Entity>("users")
                .relation("company", RelationDef::belongs_to("companies", "company_id", "id"))
                .relation("profile", RelationDef::has_one("profiles", "user_id", "id"))
                .relation("posts", RelationDef::has_many("posts", "user_id", "id")),
        )
        .register(
            EntitySchema::for_entity::<company::Entity>("companies")
                .relation("country", RelationDef::belongs_to("countries", "country_id", "id"))
                .relation("employees", RelationDef::has_many("users", "company_id", "id")),
        )
        .register(EntitySchema::for_entity::<country::Entity>("countries"))
        .register(EntitySchema::for_entity::<profile::Entity>("profiles"))
        .register(
            EntitySchema::for_entity::<post::Entity>("posts")
                .relation("author", RelationDef::belongs_to("users", "user_id", "id"))
                .relation("tags", RelationDef::belongs_to_many("tags", "post_tags", "post_id", "tag_id")),
        )
        .register(EntitySchema::for_entity::<tag::Entity>("tags"))
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(entity)))
        .await?;
    Ok(())
}

/// In-memory SQLite database with every fixture table created and filled.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    create_table(&db, user::Entity).await?;
    create_table(&db, company::Entity).await?;
    create_table(&db, country::Entity).await?;
    create_table(&db, profile::Entity).await?;
    create_table(&db, post::Entity).await?;
    create_table(&db, tag::Entity).await?;
    create_table(&db, post_tag::Entity).await?;

    user::Entity::insert_many(user_rows().into_iter().map(user::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    company::Entity::insert_many(company_rows().into_iter().map(company::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    country::Entity::insert_many(country_rows().into_iter().map(country::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    profile::Entity::insert_many(profile_rows().into_iter().map(profile::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    post::Entity::insert_many(post_rows().into_iter().map(post::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    tag::Entity::insert_many(tag_rows().into_iter().map(tag::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;
    post_tag::Entity::insert_many(post_tag_rows().into_iter().map(post_tag::ActiveModel::from))
        .exec_without_returning(&db)
        .await?;

    Ok(db)
}
