//! Session gate for the dashboards.
//!
//! Fails closed: an identity provider or store error while resolving the
//! session is treated the same as no session at all.

use serde::Serialize;

use super::{Portal, PortalError, LOGIN_PATH};
use crate::models::{Profile, Role};
use crate::store::Actor;

/// A request with a live session and a stored profile.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub actor: Actor,
    pub profile: Profile,
}

impl Viewer {
    pub fn require(&self, role: Role) -> Result<(), PortalError> {
        if self.profile.role == role {
            Ok(())
        } else {
            Err(PortalError::WrongRole { required: role })
        }
    }
}

#[derive(Debug)]
pub enum GateOutcome {
    Ready(Viewer),
    Redirect(&'static str),
}

/// What `GET /api/session` reports about the caller.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub redirect: &'static str,
}

impl From<&Viewer> for SessionInfo {
    fn from(viewer: &Viewer) -> Self {
        SessionInfo {
            user_id: viewer.profile.id,
            email: viewer.profile.email.clone(),
            name: viewer.profile.name.clone(),
            role: viewer.profile.role,
            redirect: viewer.profile.role.dashboard_path(),
        }
    }
}

impl Portal {
    /// Resolve the session behind `access_token`, if any.
    pub async fn resolve_viewer(&self, access_token: Option<&str>) -> Option<Viewer> {
        let token = access_token.filter(|t| !t.is_empty())?;

        let session = match self.identity.get_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed; treating as signed out");
                return None;
            }
        };

        let actor = Actor::from(&session);
        match self.store.profile(&actor).await {
            Ok(Some(profile)) => Some(Viewer { actor, profile }),
            Ok(None) => {
                tracing::warn!(user_id = %actor.user_id, "Session has no profile");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile lookup failed; treating as signed out");
                None
            }
        }
    }

    /// Gate entry to the dashboard for `view`. Signed-out requests go to the
    /// login page; signed-in users of the other role go to their own view.
    pub async fn enter(&self, access_token: Option<&str>, view: Role) -> GateOutcome {
        match self.resolve_viewer(access_token).await {
            None => GateOutcome::Redirect(LOGIN_PATH),
            Some(viewer) if viewer.profile.role != view => {
                GateOutcome::Redirect(viewer.profile.role.dashboard_path())
            }
            Some(viewer) => GateOutcome::Ready(viewer),
        }
    }
}
