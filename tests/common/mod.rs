#![allow(dead_code)]

use axum::Router;
use datatables_query::{
    Column, ColumnType, DataTablesQuery, EntityCollection, MemoryCollection, OrderSpec, Param,
    Search, datatables_router,
};
use datatables_query::models::DataTablesRequest;
use sea_orm::{ActiveValue, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;
use serde_json::{Value, json};

pub mod person_entity;

pub const CITIES: [&str; 5] = ["Lisbon", "Oslo", "Berlin", "Lyon", "Porto"];

/// Route `tracing` output through the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fifty people. Every tenth person (ids 5, 15, 25, 35, 45) is 42; the others
/// are 20 + id % 10, which never reaches 42.
pub fn people_documents() -> Vec<Value> {
    (1..=50)
        .map(|id| {
            let age = if id % 10 == 5 { 42 } else { 20 + id % 10 };
            json!({
                "_id": id,
                "name": format!("Person {id:02}"),
                "age": age,
                "city": CITIES[id as usize % CITIES.len()],
            })
        })
        .collect()
}

pub fn memory_people() -> MemoryCollection {
    MemoryCollection::new(people_documents())
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// In-memory SQLite database holding the same fifty people as [`people_documents`].
pub async fn setup_people_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;

    let rows = people_documents().into_iter().map(|person| person_entity::ActiveModel {
        id: ActiveValue::Set(person["_id"].as_i64().unwrap_or_default() as i32),
        name: ActiveValue::Set(person["name"].as_str().unwrap_or_default().to_string()),
        age: ActiveValue::Set(person["age"].as_i64().unwrap_or_default() as i32),
        city: ActiveValue::Set(person["city"].as_str().unwrap_or_default().to_string()),
    });
    person_entity::Entity::insert_many(rows).exec(&db).await?;

    Ok(db)
}

pub fn setup_memory_app() -> Router {
    let api = datatables_router("/people", DataTablesQuery::new(memory_people()));
    Router::new().nest("/api/v1", api)
}

pub fn setup_entity_app(db: DatabaseConnection) -> Router {
    let query = DataTablesQuery::new(EntityCollection::<person_entity::Entity>::new(db));
    Router::new().nest("/api/v1", datatables_router("/people", query))
}

/// A request over the name, age and city columns with the given global search,
/// ordered by `order_column`.
pub fn people_request(search: &str, order_column: i64, dir: &str, length: i64) -> DataTablesRequest {
    DataTablesRequest {
        draw: Some(Param::from(1)),
        start: Some(Param::from(0)),
        length: Some(Param::from(length)),
        search: Some(Search::new(search)),
        order: Some(vec![OrderSpec::new(order_column, dir)]),
        columns: Some(vec![
            Column::new("name").searchable(true),
            Column::new("age").with_type(ColumnType::Number).searchable(true),
            Column::new("city").searchable(true),
        ]),
        populate: Vec::new(),
    }
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreatePeopleTable)]
    }
}

pub struct CreatePeopleTable;

#[async_trait::async_trait]
impl MigrationName for CreatePeopleTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_people_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreatePeopleTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(PeopleEntity)
            .if_not_exists()
            .col(
                ColumnDef::new(PeopleColumn::Id)
                    .integer()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(PeopleColumn::Name).text().not_null())
            .col(ColumnDef::new(PeopleColumn::Age).integer().not_null())
            .col(ColumnDef::new(PeopleColumn::City).text().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PeopleEntity).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum PeopleColumn {
    Id,
    Name,
    Age,
    City,
}

impl Iden for PeopleColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Name => "name",
                Self::Age => "age",
                Self::City => "city",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct PeopleEntity;

impl Iden for PeopleEntity {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "people").unwrap();
    }
}
