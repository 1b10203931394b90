//! Authentication endpoints.
//!
//! `POST /api/auth/login`, `POST /api/auth/register`: sign in or up and
//! set the session cookie.
//! `POST /api/auth/logout`: revoke the caller's session, if any.
//! `GET /api/session` (protected): who the caller is.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{
    cleared_session_cookie, session_cookie, session_token, set_cookie, ApiContext, ApiJson,
};
use crate::models::Profile;
use crate::portal::{AuthOutcome, LoginForm, RegisterForm, SessionInfo, Viewer, LOGIN_PATH};

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub profile: Profile,
    pub redirect: &'static str,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub redirect: &'static str,
}

fn signed_in(outcome: AuthOutcome) -> Response {
    let cookie = session_cookie(&outcome.session.access_token, outcome.session.expires_at);
    let mut response = Json(AuthResponse {
        access_token: outcome.session.access_token,
        expires_at: outcome.session.expires_at,
        profile: outcome.profile,
        redirect: outcome.redirect,
    })
    .into_response();
    if let Some(cookie) = cookie {
        set_cookie(response.headers_mut(), cookie);
    }
    response
}

pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Response, ApiError> {
    let outcome = ctx.portal.login(&form).await?;
    Ok(signed_in(outcome))
}

pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<Response, ApiError> {
    let outcome = ctx.portal.register(&form).await?;
    Ok(signed_in(outcome))
}

pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        ctx.portal.logout(&token).await?;
    }
    let mut response = Json(LogoutResponse {
        redirect: LOGIN_PATH,
    })
    .into_response();
    set_cookie(response.headers_mut(), cleared_session_cookie());
    Ok(response)
}

pub async fn session(Extension(viewer): Extension<Viewer>) -> Json<SessionInfo> {
    Json(SessionInfo::from(&viewer))
}
