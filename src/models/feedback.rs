use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A doctor's diagnosis note attached to a report. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorFeedback {
    pub id: Uuid,
    pub report_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: String,
    pub created_at: DateTime<Utc>,
}

impl DoctorFeedback {
    pub fn new(report_id: Uuid, patient_id: Uuid, doctor_id: Uuid, diagnosis: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id,
            patient_id,
            doctor_id,
            diagnosis: diagnosis.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Feedback history row on the doctor dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackView {
    pub feedback_id: Uuid,
    pub report_id: Uuid,
    pub patient_name: String,
    pub report_name: String,
    pub diagnosis: String,
    pub created_at: DateTime<Utc>,
}
