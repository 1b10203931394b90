use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportStatus;

/// Report type stored when the patient leaves the field blank.
pub const DEFAULT_REPORT_TYPE: &str = "General";

/// Patient-owned medical document metadata. The document bytes themselves
/// are never stored; `file_name` records what the patient selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalReport {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub report_type: String,
    pub notes: String,
    pub file_name: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl MedicalReport {
    /// Build a freshly uploaded report owned by `patient_id`.
    pub fn uploaded(
        patient_id: Uuid,
        name: &str,
        report_type: &str,
        notes: &str,
        file_name: Option<&str>,
    ) -> Self {
        let report_type = match report_type.trim() {
            "" => DEFAULT_REPORT_TYPE.to_string(),
            t => t.to_string(),
        };
        Self {
            id: Uuid::new_v4(),
            patient_id,
            name: name.trim().to_string(),
            report_type,
            notes: notes.to_string(),
            file_name: file_name.map(|f| f.to_string()),
            status: ReportStatus::Uploaded,
            created_at: Utc::now(),
        }
    }
}
