//! Typed data-access interface for the portal.
//!
//! One method per query or mutation the dashboards perform. Share and
//! feedback submission are single atomic operations: the status flip and
//! the inserted row land together or not at all.

mod sqlite;
mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::identity::Session;
use crate::models::*;
use crate::supabase::SupabaseError;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

/// Who a store call is made on behalf of.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub access_token: String,
}

impl From<&Session> for Actor {
    fn from(session: &Session) -> Self {
        Actor {
            user_id: session.user.id,
            access_token: session.access_token.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    Database(DatabaseError),
    #[error("Internal lock poisoned")]
    LockPoisoned,
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => {
                StoreError::NotFound(format!("{entity_type} not found"))
            }
            DatabaseError::ConstraintViolation(message) => StoreError::Conflict(message),
            other => StoreError::Database(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::from(DatabaseError::from(err))
    }
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Api { status: 404, message } => StoreError::NotFound(message),
            SupabaseError::Api { status: 409, message } => StoreError::Conflict(message),
            other => StoreError::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PortalStore: Send + Sync {
    /// The actor's own profile.
    async fn profile(&self, actor: &Actor) -> Result<Option<Profile>, StoreError>;

    /// Profile with this email and role `doctor`.
    async fn find_doctor_by_email(
        &self,
        actor: &Actor,
        email: &str,
    ) -> Result<Option<Profile>, StoreError>;

    async fn insert_profile(&self, actor: &Actor, profile: &Profile) -> Result<(), StoreError>;

    /// The actor's own reports, newest first.
    async fn list_reports(&self, actor: &Actor) -> Result<Vec<MedicalReport>, StoreError>;

    /// One of the actor's own reports.
    async fn report(
        &self,
        actor: &Actor,
        report_id: Uuid,
    ) -> Result<Option<MedicalReport>, StoreError>;

    async fn insert_report(&self, actor: &Actor, report: &MedicalReport) -> Result<(), StoreError>;

    /// Share one of the actor's reports with a doctor and mark it `shared`.
    async fn share_report(
        &self,
        actor: &Actor,
        report_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<SharedReport, StoreError>;

    /// Reports shared with the actor, joined with report and patient, newest first.
    async fn shared_with_doctor(&self, actor: &Actor) -> Result<Vec<SharedReportView>, StoreError>;

    /// Feedback the actor has written, newest first.
    async fn feedback_history(&self, actor: &Actor) -> Result<Vec<FeedbackView>, StoreError>;

    /// Record a diagnosis for a report shared with the actor and mark it `reviewed`.
    async fn submit_feedback(
        &self,
        actor: &Actor,
        report_id: Uuid,
        diagnosis: &str,
    ) -> Result<DoctorFeedback, StoreError>;
}
