//! Identity provider backed by the local SQLite database.
//!
//! Passwords are stored as PBKDF2-SHA256 hashes with a per-account salt.
//! Access tokens are random and only their SHA-256 hash is persisted.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::Engine;
use chrono::{TimeDelta, Utc};
use pbkdf2::pbkdf2_hmac;
use rusqlite::Connection;
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::token::{constant_time_eq, generate_token, hash_token};
use super::{AccountDetails, Identity, IdentityError, IdentityProvider, Session, SignUp};
use crate::config::SESSION_TTL_RANGE;
use crate::db::{self, AccountRecord, AuthSessionRecord, DatabaseError};
use crate::models::normalize_email;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Salt for the throwaway derivation run when the email is unknown, so both
/// rejection paths cost one full derivation.
const UNKNOWN_ACCOUNT_SALT: [u8; SALT_LENGTH] = [0x5a; SALT_LENGTH];

/// Same wording as the hosted provider so clients see one message.
const INVALID_CREDENTIALS: &str = "Invalid login credentials";

pub struct LocalIdentity {
    conn: Arc<Mutex<Connection>>,
    session_ttl: TimeDelta,
    iterations: u32,
}

impl LocalIdentity {
    /// `session_ttl_secs` is capped at the top of [`SESSION_TTL_RANGE`].
    pub fn new(conn: Arc<Mutex<Connection>>, session_ttl_secs: u64) -> Self {
        let capped = session_ttl_secs.min(*SESSION_TTL_RANGE.end());
        let session_ttl = i64::try_from(capped)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(TimeDelta::zero);
        Self {
            conn,
            session_ttl,
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Override the PBKDF2 work factor.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, IdentityError> {
        self.conn.lock().map_err(|_| IdentityError::LockPoisoned)
    }

    /// PBKDF2 on the blocking pool. No lock is held while it runs.
    async fn derive(
        &self,
        password: &str,
        salt: Vec<u8>,
    ) -> Result<Zeroizing<[u8; HASH_LENGTH]>, IdentityError> {
        let password = Zeroizing::new(password.to_owned());
        let iterations = self.iterations;
        tokio::task::spawn_blocking(move || {
            let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
            pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut out[..]);
            out
        })
        .await
        .map_err(|e| IdentityError::Derivation(e.to_string()))
    }

    fn issue_session(&self, conn: &Connection, user: Identity) -> Result<Session, IdentityError> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_ttl)
            .ok_or(IdentityError::ExpiryOverflow)?;
        db::insert_auth_session(conn, &AuthSessionRecord {
            token_hash: hash_token(&token),
            user_id: user.id,
            email: user.email.clone(),
            created_at: now,
            expires_at,
        })?;
        Ok(Session {
            access_token: token,
            user,
            expires_at: Some(expires_at),
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let email = normalize_email(email);
        let account = {
            let conn = self.lock()?;
            db::get_account_by_email(&conn, &email)?
        };

        let engine = base64::engine::general_purpose::STANDARD;
        let (salt, expected) = match &account {
            Some(account) => (
                engine
                    .decode(&account.salt)
                    .map_err(|e| IdentityError::Upstream(format!("corrupt salt: {e}")))?,
                Some(
                    engine
                        .decode(&account.password_hash)
                        .map_err(|e| IdentityError::Upstream(format!("corrupt hash: {e}")))?,
                ),
            ),
            None => (UNKNOWN_ACCOUNT_SALT.to_vec(), None),
        };

        let derived = self.derive(password, salt).await?;
        let verified = expected.is_some_and(|expected| constant_time_eq(&derived[..], &expected));
        let Some(account) = account.filter(|_| verified) else {
            tracing::info!("Local sign-in rejected");
            return Err(IdentityError::InvalidCredentials(INVALID_CREDENTIALS.into()));
        };

        let conn = self.lock()?;
        db::delete_expired_sessions(&conn, Utc::now())?;
        self.issue_session(&conn, Identity {
            id: account.user_id,
            email: account.email,
        })
    }

    /// The portal writes the profile row itself on this backend, so `details`
    /// are not stored here.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _details: &AccountDetails,
    ) -> Result<SignUp, IdentityError> {
        let email = normalize_email(email);
        let salt: [u8; SALT_LENGTH] = rand::random();
        let derived = self.derive(password, salt.to_vec()).await?;
        let engine = base64::engine::general_purpose::STANDARD;

        let account = AccountRecord {
            user_id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: engine.encode(&derived[..]),
            salt: engine.encode(salt),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        db::insert_account(&conn, &account).map_err(|e| match e {
            DatabaseError::ConstraintViolation(message) => IdentityError::Rejected(message),
            other => other.into(),
        })?;

        let user = Identity {
            id: account.user_id,
            email,
        };
        let session = self.issue_session(&conn, user.clone())?;
        tracing::info!(user_id = %user.id, "Local account created");
        Ok(SignUp {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let conn = self.lock()?;
        db::delete_auth_session(&conn, &hash_token(access_token))?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let token_hash = hash_token(access_token);
        let conn = self.lock()?;
        let Some(record) = db::get_auth_session(&conn, &token_hash)? else {
            return Ok(None);
        };
        if record.expires_at <= Utc::now() {
            db::delete_auth_session(&conn, &token_hash)?;
            return Ok(None);
        }
        Ok(Some(Session {
            access_token: access_token.to_string(),
            user: Identity {
                id: record.user_id,
                email: record.email,
            },
            expires_at: Some(record.expires_at),
        }))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(self.get_session(access_token).await?.map(|s| s.user))
    }
}
