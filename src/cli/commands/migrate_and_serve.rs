use anyhow::Result;
use tracing::info;

use super::initdb::run_migrations;
use super::serve::serve;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    info!("Applying database migrations and starting server");

    // The server opens its own pool
    let db = run_migrations(database_url).await?;
    db.close().await?;

    serve(database_url, bind_address).await
}
