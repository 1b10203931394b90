//! Patient dashboard: profile, report upload and sharing with a doctor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::gate::Viewer;
use super::tabs::PatientTab;
use super::{blank, Portal, PortalError};
use crate::models::{MedicalReport, Profile, Role, SharedReport};

const SELECT_FILE: &str = "Please select a file";
const ENTER_REPORT_NAME: &str = "Please enter a report name";
const ENTER_DOCTOR_EMAIL: &str = "Please enter the doctor's email";
const DOCTOR_NOT_FOUND: &str = "Doctor not found with this email";

/// Upload form. Only the selected file's name is captured.
#[derive(Debug, Default, Deserialize)]
pub struct UploadForm {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareForm {
    pub report_id: Uuid,
    #[serde(default)]
    pub doctor_email: String,
}

#[derive(Debug, Serialize)]
pub struct ShareOutcome {
    pub share: SharedReport,
    pub reports: Vec<MedicalReport>,
}

/// Data behind the selected patient tab.
#[derive(Debug, Serialize)]
#[serde(tag = "tab", content = "data", rename_all = "snake_case")]
pub enum PatientSection {
    Profile(Profile),
    Report(Vec<MedicalReport>),
}

impl Portal {
    pub async fn patient_section(
        &self,
        viewer: &Viewer,
        tab: PatientTab,
    ) -> Result<PatientSection, PortalError> {
        viewer.require(Role::Patient)?;
        Ok(match tab {
            PatientTab::Profile => PatientSection::Profile(viewer.profile.clone()),
            PatientTab::Report => PatientSection::Report(self.patient_reports(viewer).await?),
        })
    }

    /// The viewer's reports, newest first.
    pub async fn patient_reports(&self, viewer: &Viewer) -> Result<Vec<MedicalReport>, PortalError> {
        viewer.require(Role::Patient)?;
        Ok(self.store.list_reports(&viewer.actor).await?)
    }

    /// Record a new report and return the refreshed list.
    pub async fn upload_report(
        &self,
        viewer: &Viewer,
        form: &UploadForm,
    ) -> Result<Vec<MedicalReport>, PortalError> {
        viewer.require(Role::Patient)?;
        if blank(&form.file_name) {
            return Err(PortalError::Validation(SELECT_FILE));
        }
        if blank(&form.name) {
            return Err(PortalError::Validation(ENTER_REPORT_NAME));
        }

        let report = MedicalReport::uploaded(
            viewer.actor.user_id,
            &form.name,
            &form.report_type,
            &form.notes,
            Some(form.file_name.trim()),
        );
        self.store.insert_report(&viewer.actor, &report).await?;
        tracing::info!(report_id = %report.id, report_type = %report.report_type, "Report uploaded");

        self.patient_reports(viewer).await
    }

    /// Share one of the viewer's reports with the doctor registered under
    /// `doctor_email`. Nothing is written when the doctor does not exist.
    pub async fn share_report(
        &self,
        viewer: &Viewer,
        form: &ShareForm,
    ) -> Result<ShareOutcome, PortalError> {
        viewer.require(Role::Patient)?;
        if blank(&form.doctor_email) {
            return Err(PortalError::Validation(ENTER_DOCTOR_EMAIL));
        }

        self.store
            .report(&viewer.actor, form.report_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("Report not found".into()))?;

        let doctor = self
            .store
            .find_doctor_by_email(&viewer.actor, &form.doctor_email)
            .await?
            .ok_or_else(|| PortalError::NotFound(DOCTOR_NOT_FOUND.into()))?;

        let share = self
            .store
            .share_report(&viewer.actor, form.report_id, doctor.id)
            .await?;
        tracing::info!(report_id = %share.report_id, doctor_id = %share.doctor_id, "Report shared");

        Ok(ShareOutcome {
            share,
            reports: self.patient_reports(viewer).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportStatus, DEFAULT_REPORT_TYPE};
    use crate::portal::testing::{portal, viewer};

    fn upload(name: &str, report_type: &str) -> UploadForm {
        UploadForm {
            file_name: "scan.pdf".into(),
            name: name.into(),
            report_type: report_type.into(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn upload_defaults_type_and_status() {
        let (portal, _) = portal();
        let john = viewer(&portal, "John Doe", "john@example.com", "patient").await;

        let reports = portal.upload_report(&john, &upload("Blood Test", "")).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_type, DEFAULT_REPORT_TYPE);
        assert_eq!(reports[0].status, ReportStatus::Uploaded);
        assert_eq!(reports[0].notes, "");
        assert_eq!(reports[0].file_name.as_deref(), Some("scan.pdf"));
    }

    #[tokio::test]
    async fn upload_requires_file_and_name() {
        let (portal, _) = portal();
        let john = viewer(&portal, "John Doe", "john@example.com", "patient").await;

        let mut form = upload("Blood Test", "");
        form.file_name.clear();
        let err = portal.upload_report(&john, &form).await.unwrap_err();
        assert_eq!(err.to_string(), SELECT_FILE);

        let err = portal.upload_report(&john, &upload("  ", "")).await.unwrap_err();
        assert_eq!(err.to_string(), ENTER_REPORT_NAME);
        assert!(portal.patient_reports(&john).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn share_to_unknown_or_patient_email_writes_nothing() {
        let (portal, _) = portal();
        let john = viewer(&portal, "John Doe", "john@example.com", "patient").await;
        viewer(&portal, "Jane Roe", "jane@example.com", "patient").await;
        let report = portal.upload_report(&john, &upload("ECG", "ECG")).await.unwrap()[0].clone();

        for email in ["nobody@example.com", "jane@example.com"] {
            let err = portal
                .share_report(&john, &ShareForm {
                    report_id: report.id,
                    doctor_email: email.into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, PortalError::NotFound(_)));
            assert_eq!(err.to_string(), DOCTOR_NOT_FOUND);
        }

        let reports = portal.patient_reports(&john).await.unwrap();
        assert_eq!(reports[0].status, ReportStatus::Uploaded);
    }

    #[tokio::test]
    async fn doctors_cannot_use_patient_flows() {
        let (portal, _) = portal();
        let doctor = viewer(&portal, "Dr Smith", "dr.smith@example.com", "doctor").await;
        let err = portal.upload_report(&doctor, &upload("ECG", "")).await.unwrap_err();
        assert!(matches!(err, PortalError::WrongRole { required: Role::Patient }));
    }

    #[tokio::test]
    async fn section_follows_tab() {
        let (portal, _) = portal();
        let john = viewer(&portal, "John Doe", "john@example.com", "patient").await;
        match portal.patient_section(&john, PatientTab::Profile).await.unwrap() {
            PatientSection::Profile(profile) => assert_eq!(profile.name, "John Doe"),
            other => panic!("unexpected section: {other:?}"),
        }
        assert!(matches!(
            portal.patient_section(&john, PatientTab::Report).await.unwrap(),
            PatientSection::Report(reports) if reports.is_empty()
        ));
    }
}
