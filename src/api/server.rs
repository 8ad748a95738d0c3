//! HTTP server lifecycle: bind, serve, shut down on ctrl-c.

use std::net::SocketAddr;

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::config::AppConfig;

pub async fn serve(config: AppConfig) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "listening");

    let ctx = ApiContext::new(config);
    let app = api_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
