//! Navigation surface: `/`, `/login`, `/register`, `/user`, `/doctor`.
//!
//! The dashboards pass through the session gate. Signed-out requests are
//! redirected (303) to `/login` before any fetch runs.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{session_token, ApiContext};
use crate::models::{Profile, Role};
use crate::portal::{DoctorTab, GateOutcome, PatientTab, LOGIN_PATH};

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

/// Descriptor for the login and registration forms.
#[derive(Serialize)]
pub struct AuthView {
    pub mode: &'static str,
    pub action: &'static str,
    pub fields: &'static [&'static str],
    pub roles: [Role; 2],
    pub alternate: &'static str,
}

#[derive(Serialize)]
pub struct Dashboard<T, S> {
    pub tab: T,
    pub profile: Profile,
    pub section: S,
}

pub async fn root() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

pub async fn login() -> Json<AuthView> {
    Json(AuthView {
        mode: "login",
        action: "/api/auth/login",
        fields: &["email", "password", "role"],
        roles: [Role::Patient, Role::Doctor],
        alternate: "/register",
    })
}

pub async fn register() -> Json<AuthView> {
    Json(AuthView {
        mode: "register",
        action: "/api/auth/register",
        fields: &["name", "email", "password", "confirm_password", "role"],
        roles: [Role::Patient, Role::Doctor],
        alternate: "/login",
    })
}

/// `GET /user?tab=profile|report`
pub async fn patient(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Query(query): Query<TabQuery>,
) -> Result<Response, ApiError> {
    let token = session_token(&headers);
    let viewer = match ctx.portal.enter(token.as_deref(), Role::Patient).await {
        GateOutcome::Ready(viewer) => viewer,
        GateOutcome::Redirect(path) => return Ok(Redirect::to(path).into_response()),
    };

    let tab = PatientTab::from_query(query.tab.as_deref());
    let section = ctx.portal.patient_section(&viewer, tab).await?;
    Ok(Json(Dashboard {
        tab,
        profile: viewer.profile,
        section,
    })
    .into_response())
}

/// `GET /doctor?tab=patients|history`
pub async fn doctor(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Query(query): Query<TabQuery>,
) -> Result<Response, ApiError> {
    let token = session_token(&headers);
    let viewer = match ctx.portal.enter(token.as_deref(), Role::Doctor).await {
        GateOutcome::Ready(viewer) => viewer,
        GateOutcome::Redirect(path) => return Ok(Redirect::to(path).into_response()),
    };

    let tab = DoctorTab::from_query(query.tab.as_deref());
    let section = ctx.portal.doctor_section(&viewer, tab).await?;
    Ok(Json(Dashboard {
        tab,
        profile: viewer.profile,
        section,
    })
    .into_response())
}
