use std::sync::Arc;

use mission_portal::app::{app, AppState};
use mission_portal::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SPO_REST_API_ENDPOINT, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mission_portal=info,tower_http=info".into()),
        )
        .init();

    let mut config = AppConfig::from_env()?;
    config.validate()?;
    tracing::info!("Starting mission portal in {:?} mode", config.environment);
    if let Ok(effective) = serde_json::to_string(&config) {
        tracing::debug!("effective configuration: {}", effective);
    }
    tracing::info!(
        "Reading missions from {} (resource {})",
        config.upstream.endpoint.as_ref().map(|u| u.as_str()).unwrap_or("-"),
        config.upstream.resource_id
    );

    let state = Arc::new(AppState::new(&config)?);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Mission portal listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
