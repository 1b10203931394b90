//! Shared types for the portal API layer.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::portal::Portal;

/// Cookie carrying the access token for browser clients.
pub const SESSION_COOKIE: &str = "medlink_session";

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub portal: Portal,
    pub backend: &'static str,
}

impl ApiContext {
    pub fn new(portal: Portal, backend: &'static str) -> Self {
        Self { portal, backend }
    }
}

/// JSON body extractor whose rejections use the API error body
/// (`VALIDATION`, 400) instead of axum's plain-text 4xx.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Access token from `Authorization: Bearer <token>`, falling back to the
/// session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores `token` until `expires_at`.
pub fn session_cookie(token: &str, expires_at: Option<DateTime<Utc>>) -> Option<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/");
    if let Some(expires_at) = expires_at {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("medlink_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

pub fn set_cookie(headers: &mut HeaderMap, value: HeaderValue) {
    headers.insert(SET_COOKIE, value);
}
