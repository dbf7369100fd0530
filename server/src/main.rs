use anyhow::{Context, Result};
use tracing::info;
use tokio::net::TcpListener;

use rabbit_farm_server::backend::{config::FarmConfig, create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    rabbit_farm_server::init_logging();

    let config = FarmConfig::load()?;
    let app_state = initialize_backend(&config).await?;
    let router = create_router(app_state, &config.server.cors_origin);

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!("Rabbit farm server listening on {}", config.server.bind_address);

    axum::serve(listener, router).await?;
    Ok(())
}
