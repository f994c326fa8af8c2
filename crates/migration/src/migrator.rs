//! # Database Migrator
//!
//! Implements the Sea-ORM migrator trait. Migrations run in list order and
//! their history is tracked in `seaql_migrations`.

use sea_orm_migration::prelude::*;

use crate::{
    m20240101_000001_create_tenancy_tables,
    m20240101_000002_create_jira_tables,
    m20240101_000003_create_worklog_tables,
    m20240101_000004_create_billing_tables,
};

/// The main migrator that coordinates all migration operations
///
/// # Example
///
/// ```rust,ignore
/// use migration::{Migrator, MigratorTrait};
///
/// Migrator::up(&db, None).await?;
/// ```
#[derive(Debug)]
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tenancy_tables::Migration),
            Box::new(m20240101_000002_create_jira_tables::Migration),
            Box::new(m20240101_000003_create_worklog_tables::Migration),
            Box::new(m20240101_000004_create_billing_tables::Migration),
        ]
    }
}
