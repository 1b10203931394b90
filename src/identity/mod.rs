//! Identity provider seam.
//!
//! The portal never sees passwords after hand-off: it asks the provider to
//! sign users in or up and then identifies requests by the opaque access
//! token the provider issued.

mod local;
mod supabase;
pub mod token;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Role;
use crate::supabase::SupabaseError;

pub use local::LocalIdentity;
pub use supabase::SupabaseAuth;

/// The authenticated user as the identity provider knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// An active authenticated context.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub user: Identity,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Profile details handed to the provider with a sign-up. The hosted
/// backend stores them as user metadata and creates the profile row from
/// them, so the chosen role survives email confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct AccountDetails {
    pub name: String,
    pub role: Role,
}

/// Result of a sign-up. Providers that require email confirmation return
/// no session.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: Identity,
    pub session: Option<Session>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Credentials rejected. The message is the provider's own.
    #[error("{0}")]
    InvalidCredentials(String),
    /// Provider refused the request (e.g. already registered, weak password).
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Internal lock poisoned")]
    LockPoisoned,
    #[error("Key derivation failed: {0}")]
    Derivation(String),
    #[error("Session expiry out of range")]
    ExpiryOverflow,
}

impl From<SupabaseError> for IdentityError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Api { status: 400 | 401 | 422, message } => {
                IdentityError::Rejected(message)
            }
            other => IdentityError::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        details: &AccountDetails,
    ) -> Result<SignUp, IdentityError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// `Ok(None)` when the token is unknown or expired.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError>;

    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError>;
}
