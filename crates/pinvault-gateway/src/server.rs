//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the gateway server until Ctrl-C
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let folder_id = config.folder_id.clone();

    // Create application state
    let state = Arc::new(AppState::new(config)?);

    // Bind to address
    let listener = TcpListener::bind(&addr).await?;

    info!("Pinvault gateway listening on http://{}", addr);
    info!(folder_id = %folder_id, "Serving locked folder");

    serve(listener, state, shutdown_signal()).await?;

    info!("Gateway shutdown complete");
    Ok(())
}

/// Serve the gateway on an already bound listener
///
/// Returns once `shutdown` resolves and in-flight requests have finished.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = routes::create_router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
