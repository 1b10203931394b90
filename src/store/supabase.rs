//! Store over the hosted PostgREST API.
//!
//! Reads use embedded resources for the joins; share and feedback go
//! through the `share_report` / `submit_feedback` stored procedures so each
//! runs in one database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Actor, PortalStore, StoreError};
use crate::models::*;
use crate::supabase::SupabaseClient;

const SHARED_SELECT: &str = "id,report_id,patient_id,shared_at,\
    report:medical_reports(name,report_type,notes,status),\
    patient:profiles!patient_id(name,email)";

const FEEDBACK_SELECT: &str = "id,report_id,diagnosis,created_at,\
    report:medical_reports(name),\
    patient:profiles!patient_id(name)";

#[derive(Debug, Deserialize)]
struct SharedRow {
    id: Uuid,
    report_id: Uuid,
    patient_id: Uuid,
    shared_at: DateTime<Utc>,
    report: Option<EmbeddedReport>,
    patient: Option<EmbeddedPatient>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRow {
    id: Uuid,
    report_id: Uuid,
    diagnosis: String,
    created_at: DateTime<Utc>,
    report: Option<EmbeddedReport>,
    patient: Option<EmbeddedPatient>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedReport {
    name: String,
    #[serde(default)]
    report_type: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    status: Option<ReportStatus>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedPatient {
    name: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        actor: &Actor,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let path = format!("/rest/v1/{table}");
        Ok(self
            .client
            .request(Method::GET, &path, Some(&actor.access_token), query, None)
            .await?)
    }

    async fn rpc<T: serde::de::DeserializeOwned>(
        &self,
        actor: &Actor,
        function: &str,
        args: Value,
    ) -> Result<T, StoreError> {
        let path = format!("/rest/v1/rpc/{function}");
        Ok(self
            .client
            .request(Method::POST, &path, Some(&actor.access_token), &[], Some(&args))
            .await?)
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl PortalStore for SupabaseStore {
    async fn profile(&self, actor: &Actor) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self
            .select(actor, "profiles", &[("select", "*".into()), ("id", eq(actor.user_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_doctor_by_email(
        &self,
        actor: &Actor,
        email: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self
            .select(
                actor,
                "profiles",
                &[
                    ("select", "*".into()),
                    ("email", eq(normalize_email(email))),
                    ("role", eq(Role::Doctor)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, actor: &Actor, profile: &Profile) -> Result<(), StoreError> {
        let body = json!({
            "id": profile.id,
            "email": normalize_email(&profile.email),
            "name": profile.name,
            "role": profile.role,
        });
        self.client
            .execute(Method::POST, "/rest/v1/profiles", Some(&actor.access_token), Some(&body))
            .await?;
        Ok(())
    }

    async fn list_reports(&self, actor: &Actor) -> Result<Vec<MedicalReport>, StoreError> {
        self.select(
            actor,
            "medical_reports",
            &[
                ("select", "*".into()),
                ("patient_id", eq(actor.user_id)),
                ("order", "created_at.desc".into()),
            ],
        )
        .await
    }

    async fn report(
        &self,
        actor: &Actor,
        report_id: Uuid,
    ) -> Result<Option<MedicalReport>, StoreError> {
        let rows: Vec<MedicalReport> = self
            .select(
                actor,
                "medical_reports",
                &[
                    ("select", "*".into()),
                    ("id", eq(report_id)),
                    ("patient_id", eq(actor.user_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_report(&self, actor: &Actor, report: &MedicalReport) -> Result<(), StoreError> {
        let body = serde_json::to_value(report)
            .map_err(|e| StoreError::Upstream(format!("encode report: {e}")))?;
        self.client
            .execute(
                Method::POST,
                "/rest/v1/medical_reports",
                Some(&actor.access_token),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn share_report(
        &self,
        actor: &Actor,
        report_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<SharedReport, StoreError> {
        self.rpc(
            actor,
            "share_report",
            json!({ "p_report_id": report_id, "p_doctor_id": doctor_id }),
        )
        .await
    }

    async fn shared_with_doctor(&self, actor: &Actor) -> Result<Vec<SharedReportView>, StoreError> {
        let rows: Vec<SharedRow> = self
            .select(
                actor,
                "shared_reports",
                &[
                    ("select", SHARED_SELECT.into()),
                    ("doctor_id", eq(actor.user_id)),
                    ("order", "shared_at.desc".into()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let report = row.report;
                let patient = row.patient;
                SharedReportView {
                    share_id: row.id,
                    report_id: row.report_id,
                    patient_id: row.patient_id,
                    patient_name: patient.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
                    patient_email: patient.and_then(|p| p.email).unwrap_or_default(),
                    report_name: report.as_ref().map(|r| r.name.clone()).unwrap_or_default(),
                    report_type: report
                        .as_ref()
                        .and_then(|r| r.report_type.clone())
                        .unwrap_or_else(|| DEFAULT_REPORT_TYPE.to_string()),
                    notes: report.as_ref().and_then(|r| r.notes.clone()).unwrap_or_default(),
                    status: report
                        .and_then(|r| r.status)
                        .unwrap_or(ReportStatus::Shared),
                    shared_at: row.shared_at,
                }
            })
            .collect())
    }

    async fn feedback_history(&self, actor: &Actor) -> Result<Vec<FeedbackView>, StoreError> {
        let rows: Vec<FeedbackRow> = self
            .select(
                actor,
                "doctor_feedback",
                &[
                    ("select", FEEDBACK_SELECT.into()),
                    ("doctor_id", eq(actor.user_id)),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| FeedbackView {
                feedback_id: row.id,
                report_id: row.report_id,
                patient_name: row.patient.map(|p| p.name).unwrap_or_default(),
                report_name: row.report.map(|r| r.name).unwrap_or_default(),
                diagnosis: row.diagnosis,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn submit_feedback(
        &self,
        actor: &Actor,
        report_id: Uuid,
        diagnosis: &str,
    ) -> Result<DoctorFeedback, StoreError> {
        self.rpc(
            actor,
            "submit_feedback",
            json!({ "p_report_id": report_id, "p_diagnosis": diagnosis.trim() }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::stub;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;

    const DOCTOR: &str = "0b4f0f3e-4d7a-4c55-8f0c-2f7f5b9c1a01";
    const PATIENT: &str = "1c5e1e4f-5e8b-4d66-9a1d-3a8a6c0d2b02";
    const REPORT: &str = "2d6f2f50-6f9c-4e77-8b2e-4b9b7d1e3c03";

    fn actor(id: &str) -> Actor {
        Actor {
            user_id: Uuid::parse_str(id).unwrap(),
            access_token: "jwt".into(),
        }
    }

    fn postgrest_stub() -> Router {
        Router::new()
            .route(
                "/rest/v1/profiles",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    if q.get("email").map(String::as_str) == Some("eq.dr.smith@example.com")
                        && q.get("role").map(String::as_str) == Some("eq.doctor")
                    {
                        Json(json!([{
                            "id": DOCTOR,
                            "email": "dr.smith@example.com",
                            "name": "Dr Smith",
                            "role": "doctor",
                            "created_at": "2025-10-01T09:00:00+00:00"
                        }]))
                    } else {
                        Json(json!([]))
                    }
                }),
            )
            .route(
                "/rest/v1/shared_reports",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("order").map(String::as_str), Some("shared_at.desc"));
                    Json(json!([{
                        "id": "3e7a3a61-7a0d-4f88-9c3f-5c0c8e2f4d04",
                        "report_id": REPORT,
                        "patient_id": PATIENT,
                        "shared_at": "2025-10-10T12:00:00+00:00",
                        "report": { "name": "ECG", "report_type": "ECG", "notes": "", "status": "shared" },
                        "patient": { "name": "John Doe", "email": "john@example.com" }
                    }]))
                }),
            )
            .route(
                "/rest/v1/rpc/share_report",
                post(|Json(args): Json<Value>| async move {
                    if args["p_report_id"] == REPORT {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "id": "3e7a3a61-7a0d-4f88-9c3f-5c0c8e2f4d04",
                                "report_id": REPORT,
                                "patient_id": PATIENT,
                                "doctor_id": args["p_doctor_id"],
                                "shared_at": "2025-10-10T12:00:00+00:00"
                            })),
                        )
                    } else {
                        (
                            StatusCode::NOT_FOUND,
                            Json(json!({ "code": "P0002", "message": "Report not found" })),
                        )
                    }
                }),
            )
    }

    async fn store() -> SupabaseStore {
        let base = stub::serve(postgrest_stub()).await;
        SupabaseStore::new(SupabaseClient::new(&base, "anon").unwrap())
    }

    #[tokio::test]
    async fn doctor_lookup_filters_by_email_and_role() {
        let store = store().await;
        let found = store
            .find_doctor_by_email(&actor(PATIENT), " Dr.Smith@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Dr Smith");
        assert_eq!(found.role, Role::Doctor);

        let missing = store
            .find_doctor_by_email(&actor(PATIENT), "nobody@example.com")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn shared_reports_are_flattened() {
        let store = store().await;
        let views = store.shared_with_doctor(&actor(DOCTOR)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].patient_name, "John Doe");
        assert_eq!(views[0].report_name, "ECG");
        assert_eq!(views[0].status, ReportStatus::Shared);
    }

    #[tokio::test]
    async fn share_rpc_maps_not_found() {
        let store = store().await;
        let share = store
            .share_report(
                &actor(PATIENT),
                Uuid::parse_str(REPORT).unwrap(),
                Uuid::parse_str(DOCTOR).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(share.doctor_id, Uuid::parse_str(DOCTOR).unwrap());

        let err = store
            .share_report(&actor(PATIENT), Uuid::new_v4(), Uuid::parse_str(DOCTOR).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref m) if m == "Report not found"));
    }
}
