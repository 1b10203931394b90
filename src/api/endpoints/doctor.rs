//! Doctor endpoints. All require a doctor session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};
use crate::models::{DoctorFeedback, FeedbackView, SharedReportView};
use crate::portal::{FeedbackForm, Viewer};

/// `GET /api/doctor/shared`
pub async fn shared(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<SharedReportView>>, ApiError> {
    Ok(Json(ctx.portal.shared_reports(&viewer).await?))
}

/// `GET /api/doctor/history`
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<FeedbackView>>, ApiError> {
    Ok(Json(ctx.portal.feedback_history(&viewer).await?))
}

/// `POST /api/doctor/feedback`
pub async fn feedback(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    ApiJson(form): ApiJson<FeedbackForm>,
) -> Result<(StatusCode, Json<DoctorFeedback>), ApiError> {
    let feedback = ctx.portal.submit_feedback(&viewer, &form).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
