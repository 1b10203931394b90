//! Login and registration.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{blank, Portal, PortalError};
use crate::identity::{AccountDetails, Session};
use crate::models::{normalize_email, Profile, Role};
use crate::store::Actor;

const FILL_ALL_FIELDS: &str = "Please fill in all fields";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
const PASSWORDS_DIFFER: &str = "Passwords do not match";
const INVALID_EMAIL: &str = "Please enter a valid email address";
const INVALID_ROLE: &str = "Please select a valid role";

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Login form. Wiped from memory when dropped.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// Registration form. Wiped from memory when dropped.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

/// A signed-in user and the dashboard their role leads to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub session: Session,
    pub profile: Profile,
    pub redirect: &'static str,
}

impl AuthOutcome {
    fn new(session: Session, profile: Profile) -> Self {
        let redirect = profile.role.dashboard_path();
        Self {
            session,
            profile,
            redirect,
        }
    }
}

fn parse_role(value: &str) -> Result<Role, PortalError> {
    Role::from_str(value.trim()).map_err(|_| PortalError::Validation(INVALID_ROLE))
}

impl RegisterForm {
    /// Checks run in this order and all of them before the identity
    /// provider is contacted.
    fn validate(&self) -> Result<Role, PortalError> {
        if [&self.name, &self.email, &self.password, &self.confirm_password, &self.role]
            .iter()
            .any(|field| blank(field))
        {
            return Err(PortalError::Validation(FILL_ALL_FIELDS));
        }
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(PortalError::Validation(INVALID_EMAIL));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PortalError::Validation(PASSWORD_TOO_SHORT));
        }
        if self.password != self.confirm_password {
            return Err(PortalError::Validation(PASSWORDS_DIFFER));
        }
        parse_role(&self.role)
    }
}

impl Portal {
    /// Authenticate, then check the claimed role against the stored profile.
    ///
    /// A role mismatch or a missing profile signs the fresh session back out
    /// before the error is returned.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthOutcome, PortalError> {
        if blank(&form.email) || form.password.is_empty() || blank(&form.role) {
            return Err(PortalError::Validation(FILL_ALL_FIELDS));
        }
        let claimed = parse_role(&form.role)?;

        let session = self.identity.sign_in(&form.email, &form.password).await?;
        let actor = Actor::from(&session);

        let profile = match self.store.profile(&actor).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.discard_session(&session).await;
                return Err(PortalError::NotFound("Profile not found".into()));
            }
            Err(e) => {
                self.discard_session(&session).await;
                return Err(e.into());
            }
        };

        if profile.role != claimed {
            tracing::warn!(
                user_id = %profile.id,
                claimed = %claimed,
                stored = %profile.role,
                "Login rejected: role mismatch"
            );
            self.discard_session(&session).await;
            return Err(PortalError::RoleMismatch {
                stored: profile.role,
            });
        }

        tracing::info!(user_id = %profile.id, role = %profile.role, "Signed in");
        Ok(AuthOutcome::new(session, profile))
    }

    /// Create the account, then the profile row carrying the chosen role.
    ///
    /// Providers that create the profile from the sign-up metadata (the
    /// hosted backend does, so it exists before email confirmation) leave
    /// nothing to insert.
    pub async fn register(&self, form: &RegisterForm) -> Result<AuthOutcome, PortalError> {
        let role = form.validate()?;
        let details = AccountDetails {
            name: form.name.trim().to_string(),
            role,
        };

        let signup = self
            .identity
            .sign_up(&form.email, &form.password, &details)
            .await?;
        let session = match signup.session {
            Some(session) => session,
            None => self.identity.sign_in(&form.email, &form.password).await?,
        };
        let actor = Actor::from(&session);

        let profile = match self.store.profile(&actor).await? {
            Some(existing) => existing,
            None => {
                let profile = Profile {
                    id: signup.user.id,
                    email: normalize_email(&form.email),
                    name: details.name,
                    role,
                    created_at: Utc::now(),
                };
                self.store.insert_profile(&actor, &profile).await?;
                profile
            }
        };

        tracing::info!(user_id = %profile.id, role = %profile.role, "Registered");
        Ok(AuthOutcome::new(session, profile))
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), PortalError> {
        self.identity.sign_out(access_token).await?;
        Ok(())
    }

    async fn discard_session(&self, session: &Session) {
        if let Err(e) = self.identity.sign_out(&session.access_token).await {
            tracing::warn!(error = %e, "Failed to sign out rejected session");
        }
    }
}
