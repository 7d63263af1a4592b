use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;

pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    info!("Foodgram API starting up");
    debug!("Database URL: {}", database_url);

    let state = initialize_app_state_with_url(database_url)
        .await
        .context("Failed to initialize application state")?;
    debug!("Settings: {:?}", state.settings);

    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to address {bind_address}"))?;

    info!("Foodgram API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app).await.context("Server error")?;

    info!("Server shutdown gracefully");
    Ok(())
}
