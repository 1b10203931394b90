use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportStatus;

/// Grant of doctor visibility into one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedReport {
    pub id: Uuid,
    pub report_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub shared_at: DateTime<Utc>,
}

impl SharedReport {
    pub fn new(report_id: Uuid, patient_id: Uuid, doctor_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id,
            patient_id,
            doctor_id,
            shared_at: Utc::now(),
        }
    }
}

/// A share joined with its report metadata and the owning patient's profile,
/// as listed on the doctor dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedReportView {
    pub share_id: Uuid,
    pub report_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub report_name: String,
    pub report_type: String,
    pub notes: String,
    pub status: ReportStatus,
    pub shared_at: DateTime<Utc>,
}
