//! Portal server lifecycle: bind → spawn background task → return a handle
//! with a shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::portal_router;
use crate::api::types::ApiContext;

/// Handle to a running portal server.
pub struct PortalServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PortalServer {
    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Portal server shutdown signal sent");
        }
        if let Err(e) = self.task.await {
            tracing::error!("Portal server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve the portal router in a background task.
pub async fn start_portal_server(ctx: ApiContext, addr: SocketAddr) -> Result<PortalServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind portal server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = portal_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Portal server received shutdown signal");
        };

        tracing::info!(%addr, "Portal server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Portal server error: {e}");
        }

        tracing::info!("Portal server stopped");
    });

    Ok(PortalServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::portal;

    #[tokio::test]
    async fn serves_health_and_shuts_down() {
        let (portal, _) = portal();
        let ctx = ApiContext::new(portal, "local");
        let server = start_portal_server(ctx, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(server.addr.port(), 0);

        let url = format!("http://{}/api/health", server.addr);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");

        server.shutdown().await;
        assert!(reqwest::get(&url).await.is_err());
    }
}
