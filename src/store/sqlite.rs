use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;
use uuid::Uuid;

use super::{Actor, PortalStore, StoreError};
use crate::db;
use crate::models::*;

/// Store over the embedded database. Row ownership is enforced here the
/// way row-level security enforces it on the hosted backend.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl PortalStore for SqliteStore {
    async fn profile(&self, actor: &Actor) -> Result<Option<Profile>, StoreError> {
        let conn = self.lock()?;
        Ok(db::get_profile(&conn, &actor.user_id)?)
    }

    async fn find_doctor_by_email(
        &self,
        _actor: &Actor,
        email: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let conn = self.lock()?;
        Ok(db::find_profile_by_email(&conn, email, Role::Doctor)?)
    }

    async fn insert_profile(&self, actor: &Actor, profile: &Profile) -> Result<(), StoreError> {
        if profile.id != actor.user_id {
            return Err(StoreError::Conflict("Profile id must match the signed-in user".into()));
        }
        let conn = self.lock()?;
        db::insert_profile(&conn, profile)?;
        Ok(())
    }

    async fn list_reports(&self, actor: &Actor) -> Result<Vec<MedicalReport>, StoreError> {
        let conn = self.lock()?;
        Ok(db::list_reports_for_patient(&conn, &actor.user_id)?)
    }

    async fn report(
        &self,
        actor: &Actor,
        report_id: Uuid,
    ) -> Result<Option<MedicalReport>, StoreError> {
        let conn = self.lock()?;
        Ok(db::get_report(&conn, &report_id)?.filter(|r| r.patient_id == actor.user_id))
    }

    async fn insert_report(&self, actor: &Actor, report: &MedicalReport) -> Result<(), StoreError> {
        if report.patient_id != actor.user_id {
            return Err(StoreError::Conflict("Reports can only be uploaded for yourself".into()));
        }
        let conn = self.lock()?;
        db::insert_report(&conn, report)?;
        Ok(())
    }

    async fn share_report(
        &self,
        actor: &Actor,
        report_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<SharedReport, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let report = db::get_report(&tx, &report_id)?
            .filter(|r| r.patient_id == actor.user_id)
            .ok_or_else(|| StoreError::NotFound("Report not found".into()))?;
        db::get_profile(&tx, &doctor_id)?
            .filter(|p| p.role == Role::Doctor)
            .ok_or_else(|| StoreError::NotFound("Doctor not found".into()))?;

        let share = SharedReport::new(report.id, actor.user_id, doctor_id);
        db::insert_share(&tx, &share)?;
        db::update_report_status(&tx, &report.id, ReportStatus::Shared)?;
        tx.commit()?;
        Ok(share)
    }

    async fn shared_with_doctor(&self, actor: &Actor) -> Result<Vec<SharedReportView>, StoreError> {
        let conn = self.lock()?;
        Ok(db::list_shares_for_doctor(&conn, &actor.user_id)?)
    }

    async fn feedback_history(&self, actor: &Actor) -> Result<Vec<FeedbackView>, StoreError> {
        let conn = self.lock()?;
        Ok(db::list_feedback_for_doctor(&conn, &actor.user_id)?)
    }

    async fn submit_feedback(
        &self,
        actor: &Actor,
        report_id: Uuid,
        diagnosis: &str,
    ) -> Result<DoctorFeedback, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let patient_id = db::shared_report_patient(&tx, &report_id, &actor.user_id)?
            .ok_or_else(|| StoreError::NotFound("Report not found".into()))?;

        let feedback = DoctorFeedback::new(report_id, patient_id, actor.user_id, diagnosis);
        db::insert_feedback(&tx, &feedback)?;
        db::update_report_status(&tx, &report_id, ReportStatus::Reviewed)?;
        tx.commit()?;
        Ok(feedback)
    }
}
