//! Portal router.
//!
//! Views are mounted at the root; JSON endpoints are nested under `/api/`.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! Extension → no-store header → Access log → Session gate → Handler

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the portal router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn portal_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/session", get(endpoints::auth::session))
        .route(
            "/patient/reports",
            get(endpoints::patient::list).post(endpoints::patient::upload),
        )
        .route("/patient/share", post(endpoints::patient::share))
        .route("/doctor/shared", get(endpoints::doctor::shared))
        .route("/doctor/history", get(endpoints::doctor::history))
        .route("/doctor/feedback", post(endpoints::doctor::feedback))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_session))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access));

    let views = Router::new()
        .route("/", get(endpoints::views::root))
        .route("/login", get(endpoints::views::login))
        .route("/register", get(endpoints::views::register))
        .route("/user", get(endpoints::views::patient))
        .route("/doctor", get(endpoints::views::doctor))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected.merge(public))
        .merge(views)
        .layer(CorsLayer::permissive())
}
