//! # Workledger Migrations
//!
//! SQLite schema for every Workledger table. Foreign keys are declared inside
//! `CREATE TABLE` since SQLite cannot add them afterwards.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_tenancy_tables;
mod m20240101_000002_create_jira_tables;
mod m20240101_000003_create_worklog_tables;
mod m20240101_000004_create_billing_tables;
pub mod migrator;

pub use migrator::Migrator;

/// Database connection helper for CLI usage
pub async fn connect_to_database(database_url: &str) -> Result<sea_orm::DatabaseConnection, sea_orm::DbErr> {
    sea_orm::Database::connect(database_url).await
}
