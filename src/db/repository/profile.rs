use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

struct ProfileRow {
    id: String,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

fn profile_from_row(row: ProfileRow) -> Result<Profile, DatabaseError> {
    Ok(Profile {
        id: parse_id("id", &row.id)?,
        email: row.email,
        name: row.name,
        role: Role::from_str(&row.role)?,
        created_at: row.created_at,
    })
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, email, name, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            profile.id.to_string(),
            normalize_email(&profile.email),
            profile.name,
            profile.role.as_str(),
            profile.created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "profile already exists for {}",
                profile.email
            ))
        }
        other => other.into(),
    })?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    conn.query_row(
        "SELECT id, email, name, role, created_at FROM profiles WHERE id = ?1",
        params![id.to_string()],
        read_row,
    )
    .optional()?
    .map(profile_from_row)
    .transpose()
}

/// Look up a profile by email, constrained to one role.
pub fn find_profile_by_email(
    conn: &Connection,
    email: &str,
    role: Role,
) -> Result<Option<Profile>, DatabaseError> {
    conn.query_row(
        "SELECT id, email, name, role, created_at FROM profiles
         WHERE email = ?1 AND role = ?2",
        params![normalize_email(email), role.as_str()],
        read_row,
    )
    .optional()?
    .map(profile_from_row)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn profile_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let created = make_profile(&conn, "Jane@Example.com", "Jane Doe", Role::Patient);
        let loaded = get_profile(&conn, &created.id).unwrap().unwrap();
        assert_eq!(loaded.email, "jane@example.com");
        assert_eq!(loaded.name, "Jane Doe");
        assert_eq!(loaded.role, Role::Patient);
    }

    #[test]
    fn unknown_profile_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_profile(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn find_by_email_respects_role() {
        let conn = open_memory_database().unwrap();
        make_profile(&conn, "dr.smith@example.com", "Dr Smith", Role::Doctor);
        make_profile(&conn, "john@example.com", "John", Role::Patient);

        let doctor = find_profile_by_email(&conn, " DR.SMITH@example.com", Role::Doctor).unwrap();
        assert_eq!(doctor.unwrap().name, "Dr Smith");

        let not_doctor = find_profile_by_email(&conn, "john@example.com", Role::Doctor).unwrap();
        assert!(not_doctor.is_none());
    }

    #[test]
    fn duplicate_email_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        make_profile(&conn, "john@example.com", "John", Role::Patient);
        let dup = Profile {
            id: Uuid::new_v4(),
            email: "john@example.com".into(),
            name: "Other John".into(),
            role: Role::Doctor,
            created_at: at(1),
        };
        let err = insert_profile(&conn, &dup).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }
}
