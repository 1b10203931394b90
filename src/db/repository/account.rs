//! Credential and session rows backing the local identity provider.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;

/// Stored credentials. Hash and salt are base64-encoded.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// A session issued by the local identity provider. Only the SHA-256 hash
/// of the bearer token is stored.
#[derive(Debug, Clone)]
pub struct AuthSessionRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub fn insert_account(conn: &Connection, account: &AccountRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO accounts (user_id, email, password_hash, salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.user_id.to_string(),
            account.email,
            account.password_hash,
            account.salt,
            account.created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation("User already registered".into())
        }
        other => other.into(),
    })?;
    Ok(())
}

pub fn get_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<AccountRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, email, password_hash, salt, created_at
             FROM accounts WHERE email = ?1",
            params![email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((user_id, email, password_hash, salt, created_at)) => Ok(Some(AccountRecord {
            user_id: parse_id("user_id", &user_id)?,
            email,
            password_hash,
            salt,
            created_at,
        })),
        None => Ok(None),
    }
}

pub fn insert_auth_session(
    conn: &Connection,
    session: &AuthSessionRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO auth_sessions (token_hash, user_id, email, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.token_hash,
            session.user_id.to_string(),
            session.email,
            session.created_at,
            session.expires_at,
        ],
    )?;
    Ok(())
}

pub fn get_auth_session(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<AuthSessionRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT token_hash, user_id, email, created_at, expires_at
             FROM auth_sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, DateTime<Utc>>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((token_hash, user_id, email, created_at, expires_at)) => {
            Ok(Some(AuthSessionRecord {
                token_hash,
                user_id: parse_id("user_id", &user_id)?,
                email,
                created_at,
                expires_at,
            }))
        }
        None => Ok(None),
    }
}

/// Returns `true` when a session row was removed.
pub fn delete_auth_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM auth_sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(rows > 0)
}

pub fn delete_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize, DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM auth_sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(rows)
}
