use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_share(conn: &Connection, share: &SharedReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO shared_reports (id, report_id, patient_id, doctor_id, shared_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            share.id.to_string(),
            share.report_id.to_string(),
            share.patient_id.to_string(),
            share.doctor_id.to_string(),
            share.shared_at,
        ],
    )?;
    Ok(())
}

/// Patient id of a report shared with `doctor_id`, if it was shared.
pub fn shared_report_patient(
    conn: &Connection,
    report_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<Option<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id FROM shared_reports
         WHERE report_id = ?1 AND doctor_id = ?2
         LIMIT 1",
    )?;
    let mut rows = stmt.query(params![report_id.to_string(), doctor_id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_id("patient_id", &row.get::<_, String>(0)?)?)),
        None => Ok(None),
    }
}

pub fn count_shares_for_report(conn: &Connection, report_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM shared_reports WHERE report_id = ?1",
        params![report_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Shares received by a doctor, joined with report metadata and the owning
/// patient's profile, newest first.
pub fn list_shares_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<SharedReportView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.report_id, s.patient_id, p.name, p.email,
                r.name, r.report_type, r.notes, r.status, s.shared_at
         FROM shared_reports s
         JOIN medical_reports r ON r.id = s.report_id
         JOIN profiles p ON p.id = s.patient_id
         WHERE s.doctor_id = ?1
         ORDER BY s.shared_at DESC",
    )?;

    let rows = stmt.query_map(params![doctor_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
            row.get::<_, DateTime<Utc>>(9)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (share_id, report_id, patient_id, patient_name, patient_email, report_name,
             report_type, notes, status, shared_at) = row?;
        views.push(SharedReportView {
            share_id: parse_id("id", &share_id)?,
            report_id: parse_id("report_id", &report_id)?,
            patient_id: parse_id("patient_id", &patient_id)?,
            patient_name,
            patient_email,
            report_name,
            report_type,
            notes,
            status: ReportStatus::from_str(&status)?,
            shared_at,
        });
    }
    Ok(views)
}
