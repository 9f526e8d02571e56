use dotenvy::dotenv;
use invigil::relay::{create_router, RelayConfig, RelayState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = RelayConfig::from_env();

    let state = RelayState::new(config.upstream_url.clone());
    let app = create_router(state);

    tracing::info!(
        upstream = %config.upstream_url,
        "relay listening on {}",
        config.listen_addr
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind relay listen address");

    axum::serve(listener, app).await.expect("relay server failed");
}
