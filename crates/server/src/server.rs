//! Server initialization and routing

use crate::config::ServerConfig;
use crate::pipeline;
use crate::routes::{api_info, entities, health, not_found};
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;

/// Build the complete application: routes, 404 fallback and the request
/// pipeline around them.
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics));

    let routes = entities::mount(routes).fallback(not_found);

    pipeline::apply(routes, state)
}

/// Start the docapi HTTP server
///
/// Installs the JSON tracing subscriber and (when enabled) the Prometheus
/// recorder, opens the document store, then serves until SIGTERM or Ctrl+C.
/// The store is flushed after the last connection drains.
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let addr: SocketAddr = config.socket_addr()?;

    let mut state = AppState::new(config.clone())?;
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }
    let state = Arc::new(state);

    let app = build_router(state.clone());

    tracing::info!(
        "Starting docapi server on {} with {} API keys",
        addr,
        config.api_keys.len()
    );
    tracing::info!(
        database = %config.database.database_name,
        connection = %config.database.connection_string,
        telegraph = config.telegraph.is_some(),
        "store configured"
    );
    tracing::info!(
        "CORS: {}, Compression: {}, Metrics: {}",
        config.enable_cors,
        config.enable_compression,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown()?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
