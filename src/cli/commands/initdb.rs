use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, info};

/// Connects and applies every pending migration.
pub async fn run_migrations(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{database_url}'"))?;
    info!("Connected to database");

    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    Ok(db)
}

pub async fn init_database(database_url: &str) -> Result<()> {
    info!("Initializing database");
    run_migrations(database_url).await?;
    info!("Database initialization completed successfully");
    Ok(())
}
