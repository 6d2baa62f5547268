//! Schema migrations for the Agora database.

pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_tables;
mod m20260201_000002_create_friendships;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_tables::Migration),
            Box::new(m20260201_000002_create_friendships::Migration),
        ]
    }
}
