//! Access logging middleware.
//!
//! Logs every API request with method, path and response status. Runs
//! outside the session gate so rejected requests are logged too; the
//! caller's user id is read from the `Viewer` the gate attaches to the
//! response.

use std::time::Instant;

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::portal::Viewer;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    // Nested routers see the path with the mount prefix stripped.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let user_id = response.extensions().get::<Viewer>().map(|v| v.profile.id);
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match user_id {
        Some(user_id) => {
            tracing::info!(%method, path = %path, status, elapsed_ms, %user_id, "API access")
        }
        None => tracing::info!(%method, path = %path, status, elapsed_ms, "API access"),
    }

    response
}
