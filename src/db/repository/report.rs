use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

const REPORT_COLUMNS: &str =
    "id, patient_id, name, report_type, notes, file_name, status, created_at";

struct ReportRow {
    id: String,
    patient_id: String,
    name: String,
    report_type: String,
    notes: String,
    file_name: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        report_type: row.get(3)?,
        notes: row.get(4)?,
        file_name: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<MedicalReport, DatabaseError> {
    Ok(MedicalReport {
        id: parse_id("id", &row.id)?,
        patient_id: parse_id("patient_id", &row.patient_id)?,
        name: row.name,
        report_type: row.report_type,
        notes: row.notes,
        file_name: row.file_name,
        status: ReportStatus::from_str(&row.status)?,
        created_at: row.created_at,
    })
}

pub fn insert_report(conn: &Connection, report: &MedicalReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_reports (id, patient_id, name, report_type, notes, file_name,
         status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.id.to_string(),
            report.patient_id.to_string(),
            report.name,
            report.report_type,
            report.notes,
            report.file_name,
            report.status.as_str(),
            report.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<MedicalReport>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {REPORT_COLUMNS} FROM medical_reports WHERE id = ?1"),
        params![id.to_string()],
        read_row,
    )
    .optional()?
    .map(report_from_row)
    .transpose()
}

/// All reports owned by a patient, newest first.
pub fn list_reports_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<MedicalReport>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM medical_reports
         WHERE patient_id = ?1
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_row)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row?)?);
    }
    Ok(reports)
}

/// Update only the status of a report.
pub fn update_report_status(
    conn: &Connection,
    report_id: &Uuid,
    status: ReportStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE medical_reports SET status = ?2 WHERE id = ?1",
        params![report_id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicalReport".into(),
            id: report_id.to_string(),
        });
    }
    Ok(())
}
