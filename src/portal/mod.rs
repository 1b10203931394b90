//! Portal flows: the role-gated views and the fetch/mutate operations each
//! one performs against the identity provider and the store.
//!
//! Every flow validates its input before making any remote call, and every
//! remote error reaches the caller with the provider's own message.

pub mod auth;
pub mod doctor;
pub mod gate;
pub mod patient;
pub mod tabs;

use std::sync::Arc;

use crate::identity::{IdentityError, IdentityProvider};
use crate::models::Role;
use crate::store::{PortalStore, StoreError};

pub use auth::{AuthOutcome, LoginForm, RegisterForm};
pub use doctor::{DoctorSection, FeedbackForm};
pub use gate::{GateOutcome, SessionInfo, Viewer};
pub use patient::{PatientSection, ShareForm, ShareOutcome, UploadForm};
pub use tabs::{DoctorTab, PatientTab};

/// Destination for anyone without a usable session.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Input rejected before any remote call was made.
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("This account is registered as a {stored}. Please select the correct role.")]
    RoleMismatch { stored: Role },
    #[error("This action requires a {required} account")]
    WrongRole { required: Role },
    /// The identity provider refused the credentials.
    #[error("{0}")]
    CredentialsRejected(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdentityError> for PortalError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials(message) => PortalError::CredentialsRejected(message),
            IdentityError::Rejected(message) => PortalError::Conflict(message),
            IdentityError::Upstream(message) => PortalError::Upstream(message),
            other => PortalError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => PortalError::NotFound(message),
            StoreError::Conflict(message) => PortalError::Conflict(message),
            StoreError::Upstream(message) => PortalError::Upstream(message),
            other => PortalError::Internal(other.to_string()),
        }
    }
}

/// The portal's two capabilities. Cheap to clone.
#[derive(Clone)]
pub struct Portal {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn PortalStore>,
}

impl Portal {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn PortalStore>) -> Self {
        Self { identity, store }
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }
}

/// Trimmed value is empty.
fn blank(value: &str) -> bool {
    value.trim().is_empty()
}
