//! Serves the atmos API. Configuration comes from the environment (and `.env` when present).
//!
//! Run from repo root: `cargo run -p atmos-server`

use atmos_api::{app, ApiConfig, AppState};
use axum::extract::Request;
use axum::ServiceExt;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("atmos_api=info,tower_http=info")),
        )
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(
        host = %config.database.host,
        database = %config.database.name,
        schema = %config.database.schema,
        "database configured"
    );
    let bind_addr = config.bind_addr;
    let state = AppState::new(config);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
