//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_reports;
mod m20250301_000002_create_documents;
mod m20250301_000003_create_issues;
mod m20250301_000004_create_api_credentials;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_reports::Migration),
            Box::new(m20250301_000002_create_documents::Migration),
            Box::new(m20250301_000003_create_issues::Migration),
            Box::new(m20250301_000004_create_api_credentials::Migration),
        ]
    }
}
