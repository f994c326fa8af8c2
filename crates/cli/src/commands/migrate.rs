//! # Migrate Command
//!
//! Applies, rolls back or lists schema migrations.

use anyhow::Context as _;
use migration::{Migrator, MigratorTrait as _};
use tracing::info;

use crate::commands::MigrateArgs;

pub async fn migrate(database_url: &str, args: &MigrateArgs) -> anyhow::Result<()> {
    info!(
        target: "migrate",
        dry_run = %args.dry_run,
        rollback = %args.rollback,
        "Running database migrations..."
    );

    let db = migration::connect_to_database(database_url)
        .await
        .context("Failed to connect to database")?;

    if args.dry_run {
        let pending = Migrator::get_pending_migrations(&db)
            .await
            .context("Failed to get pending migrations")?;
        info!(target: "migrate", pending_count = pending.len(), "Pending migrations found");
        for m in &pending {
            println!("{}", m.name());
        }
        return Ok(());
    }

    if args.rollback {
        Migrator::down(&db, Some(1))
            .await
            .context("Failed to rollback migration")?;
        info!(target: "migrate", "Rollback completed successfully");
        return Ok(());
    }

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    info!(target: "migrate", "Migrations completed successfully");
    Ok(())
}
