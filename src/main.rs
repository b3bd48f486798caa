use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use quickride::api;
use quickride::config::Config;
use quickride::error::DispatchError;
use quickride::seed;
use quickride::state::AppState;

#[tokio::main]
async fn main() -> Result<(), DispatchError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let state = Arc::new(AppState::new(config.event_buffer_size));

    if config.seed_vehicles > 0 {
        let seeded = seed::seed_fleet(&state.fleet, config.seed_vehicles);
        state.refresh_vehicle_gauges();
        tracing::info!(seeded, "demo fleet seeded");
    }

    let app = api::rest::router(state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| DispatchError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| DispatchError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
