//! Session authentication middleware.
//!
//! Resolves the caller's access token (bearer header or session cookie)
//! through the session gate and injects the resulting `Viewer` into request
//! extensions for downstream handlers. The same `Viewer` is attached to the
//! response for the access log.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{session_token, ApiContext};

/// Require a live session.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = session_token(req.headers()).ok_or(ApiError::Unauthorized)?;
    let viewer = ctx
        .portal
        .resolve_viewer(Some(&token))
        .await
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(viewer.clone());
    let mut response = next.run(req).await;
    response.extensions_mut().insert(viewer);
    Ok(response)
}
