use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_feedback(conn: &Connection, feedback: &DoctorFeedback) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctor_feedback (id, report_id, patient_id, doctor_id, diagnosis, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            feedback.id.to_string(),
            feedback.report_id.to_string(),
            feedback.patient_id.to_string(),
            feedback.doctor_id.to_string(),
            feedback.diagnosis,
            feedback.created_at,
        ],
    )?;
    Ok(())
}

pub fn count_feedback_for_report(conn: &Connection, report_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM doctor_feedback WHERE report_id = ?1",
        params![report_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// A doctor's diagnosis history, joined with patient and report names,
/// newest first.
pub fn list_feedback_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<FeedbackView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.report_id, p.name, r.name, f.diagnosis, f.created_at
         FROM doctor_feedback f
         JOIN medical_reports r ON r.id = f.report_id
         JOIN profiles p ON p.id = f.patient_id
         WHERE f.doctor_id = ?1
         ORDER BY f.created_at DESC",
    )?;

    let rows = stmt.query_map(params![doctor_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, DateTime<Utc>>(5)?,
        ))
    })?;

    let mut history = Vec::new();
    for row in rows {
        let (id, report_id, patient_name, report_name, diagnosis, created_at) = row?;
        history.push(FeedbackView {
            feedback_id: parse_id("id", &id)?,
            report_id: parse_id("report_id", &report_id)?,
            patient_name,
            report_name,
            diagnosis,
            created_at,
        });
    }
    Ok(history)
}
