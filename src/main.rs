use std::net::SocketAddr;

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use webapp_dashboard::{AppState, Config, WebAppClient, api};

async fn healthz() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter, defaulting to debug levels if RUST_LOG is unset.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug,axum=info,reqwest=info,hyper_util=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let config = Config::load()?;
    let client = WebAppClient::from_config(&config).context("Failed to build backend client")?;
    tracing::info!(api_base_url = %client.base_url(), "using webapp backend");

    let state = AppState::new(client, &config);

    // dashboard mount
    state.dashboard.load_list().await;
    state.reconciler.mount();

    let app = Router::new()
        .route("/healthz", get(healthz))
        .merge(api::routes())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr.parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    state.reconciler.unmount();
    state.dashboard.shutdown();

    Ok(())
}
