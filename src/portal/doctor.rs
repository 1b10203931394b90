//! Doctor dashboard: reports shared with the doctor, feedback history, and
//! diagnosis submission.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::gate::Viewer;
use super::tabs::DoctorTab;
use super::{blank, Portal, PortalError};
use crate::models::{DoctorFeedback, FeedbackView, Role, SharedReportView};

const ENTER_DIAGNOSIS: &str = "Please enter a diagnosis";

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub report_id: Uuid,
    #[serde(default)]
    pub diagnosis: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "tab", content = "data", rename_all = "snake_case")]
pub enum DoctorSection {
    Patients(Vec<SharedReportView>),
    History(Vec<FeedbackView>),
}

impl Portal {
    pub async fn doctor_section(
        &self,
        viewer: &Viewer,
        tab: DoctorTab,
    ) -> Result<DoctorSection, PortalError> {
        Ok(match tab {
            DoctorTab::Patients => DoctorSection::Patients(self.shared_reports(viewer).await?),
            DoctorTab::History => DoctorSection::History(self.feedback_history(viewer).await?),
        })
    }

    pub async fn shared_reports(&self, viewer: &Viewer) -> Result<Vec<SharedReportView>, PortalError> {
        viewer.require(Role::Doctor)?;
        Ok(self.store.shared_with_doctor(&viewer.actor).await?)
    }

    pub async fn feedback_history(&self, viewer: &Viewer) -> Result<Vec<FeedbackView>, PortalError> {
        viewer.require(Role::Doctor)?;
        Ok(self.store.feedback_history(&viewer.actor).await?)
    }

    /// Attach a diagnosis to a report shared with the viewer.
    pub async fn submit_feedback(
        &self,
        viewer: &Viewer,
        form: &FeedbackForm,
    ) -> Result<DoctorFeedback, PortalError> {
        viewer.require(Role::Doctor)?;
        if blank(&form.diagnosis) {
            return Err(PortalError::Validation(ENTER_DIAGNOSIS));
        }

        let feedback = self
            .store
            .submit_feedback(&viewer.actor, form.report_id, form.diagnosis.trim())
            .await?;
        tracing::info!(report_id = %feedback.report_id, feedback_id = %feedback.id, "Feedback submitted");
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportStatus;
    use crate::portal::patient::{ShareForm, UploadForm};
    use crate::db;
    use crate::portal::testing::{portal, portal_with_db, viewer};

    #[tokio::test]
    async fn ecg_is_shared_reviewed_and_recorded() {
        let (portal, _, conn) = portal_with_db();
        let john = viewer(&portal, "John Doe", "john@example.com", "patient").await;
        let smith = viewer(&portal, "Dr Smith", "dr.smith@example.com", "doctor").await;

        let reports = portal
            .upload_report(&john, &UploadForm {
                file_name: "ecg.pdf".into(),
                name: "ECG".into(),
                report_type: "ECG".into(),
                notes: "Resting".into(),
            })
            .await
            .unwrap();
        let ecg = reports[0].clone();

        let shared = portal
            .share_report(&john, &ShareForm {
                report_id: ecg.id,
                doctor_email: "dr.smith@example.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(shared.share.doctor_id, smith.profile.id);
        assert_eq!(shared.reports[0].status, ReportStatus::Shared);

        let inbox = portal.shared_reports(&smith).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].patient_name, "John Doe");
        assert_eq!(inbox[0].report_name, "ECG");
        assert_eq!(inbox[0].status, ReportStatus::Shared);

        let feedback = portal
            .submit_feedback(&smith, &FeedbackForm {
                report_id: ecg.id,
                diagnosis: "Normal rhythm".into(),
            })
            .await
            .unwrap();
        assert_eq!(feedback.diagnosis, "Normal rhythm");
        assert_eq!(feedback.patient_id, john.profile.id);

        let reports = portal.patient_reports(&john).await.unwrap();
        assert_eq!(reports[0].status, ReportStatus::Reviewed);

        let history = portal.feedback_history(&smith).await.unwrap();
        assert_eq!(history[0].diagnosis, "Normal rhythm");
        assert_eq!(history[0].patient_name, "John Doe");
        let conn = conn.lock().unwrap();
        assert_eq!(db::count_feedback_for_report(&conn, &ecg.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_diagnosis_is_rejected() {
        let (portal, _) = portal();
        let smith = viewer(&portal, "Dr Smith", "dr.smith@example.com", "doctor").await;
        let err = portal
            .submit_feedback(&smith, &FeedbackForm {
                report_id: Uuid::new_v4(),
                diagnosis: "   ".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), ENTER_DIAGNOSIS);
    }

    #[tokio::test]
    async fn feedback_on_unshared_report_is_not_found() {
        let (portal, _) = portal();
        let smith = viewer(&portal, "Dr Smith", "dr.smith@example.com", "doctor").await;
        let err = portal
            .submit_feedback(&smith, &FeedbackForm {
                report_id: Uuid::new_v4(),
                diagnosis: "Normal rhythm".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_dashboard_sections() {
        let (portal, _) = portal();
        let smith = viewer(&portal, "Dr Smith", "dr.smith@example.com", "doctor").await;
        assert!(matches!(
            portal.doctor_section(&smith, DoctorTab::Patients).await.unwrap(),
            DoctorSection::Patients(rows) if rows.is_empty()
        ));
        assert!(matches!(
            portal.doctor_section(&smith, DoctorTab::History).await.unwrap(),
            DoctorSection::History(rows) if rows.is_empty()
        ));
    }
}
