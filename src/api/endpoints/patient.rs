//! Patient endpoints. All require a patient session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::MedicalReport;
use crate::portal::{ShareForm, ShareOutcome, UploadForm, Viewer};

/// `GET /api/patient/reports`: the caller's reports, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<MedicalReport>>, ApiError> {
    Ok(Json(ctx.portal.patient_reports(&viewer).await?))
}

/// `POST /api/patient/reports`: record an upload, returns the refreshed list.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    ApiJson(form): ApiJson<UploadForm>,
) -> Result<(StatusCode, Json<Vec<MedicalReport>>), ApiError> {
    let reports = ctx.portal.upload_report(&viewer, &form).await?;
    Ok((StatusCode::CREATED, Json(reports)))
}

/// `POST /api/patient/share`: share a report with a doctor by email.
pub async fn share(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    ApiJson(form): ApiJson<ShareForm>,
) -> Result<Json<ShareOutcome>, ApiError> {
    Ok(Json(ctx.portal.share_report(&viewer, &form).await?))
}
