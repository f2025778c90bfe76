mod api;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    path::PathBuf,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use state::AppState;

pub const DEFAULT_PORT: u16 = 8473;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/fill-forecast", post(api::fill_forecast))
        .route("/api/copy-structure", post(api::copy_structure))
        .route("/api/aggregate", post(api::aggregate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API over the data file at `store_path` until ctrl-c.
pub async fn run(store_path: PathBuf, port: u16) -> anyhow::Result<()> {
    // Initialize tracing if not already initialized
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pnl_forecast=info,pnl_forecast_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let state = AppState::open(store_path)?;
    tracing::info!("Serving data file {}", state.store_path().display());
    let app = router(state);

    let listen = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("Server listening on http://{}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
