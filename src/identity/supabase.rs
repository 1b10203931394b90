//! Identity provider backed by the hosted GoTrue service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AccountDetails, Identity, IdentityError, IdentityProvider, Session, SignUp};
use crate::models::normalize_email;
use crate::supabase::{SupabaseClient, SupabaseError};

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl From<GoTrueUser> for Identity {
    fn from(user: GoTrueUser) -> Self {
        Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

impl From<GoTrueSession> for Session {
    fn from(session: GoTrueSession) -> Self {
        Session {
            access_token: session.access_token,
            expires_at: session
                .expires_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            user: session.user.into(),
        }
    }
}

pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, IdentityError> {
    serde_json::from_value(value).map_err(|e| IdentityError::Upstream(format!("Unexpected response: {e}")))
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let body = json!({ "email": normalize_email(email), "password": password });
        let result: Result<GoTrueSession, SupabaseError> = self
            .client
            .request(
                Method::POST,
                "/auth/v1/token",
                None,
                &[("grant_type", "password".to_string())],
                Some(&body),
            )
            .await;

        match result {
            Ok(session) => Ok(session.into()),
            Err(SupabaseError::Api { status: 400 | 401, message }) => {
                Err(IdentityError::InvalidCredentials(message))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// `details` travel as user metadata; the `on_auth_user_created` trigger
    /// turns them into the profile row even while confirmation is pending.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        details: &AccountDetails,
    ) -> Result<SignUp, IdentityError> {
        let body = json!({
            "email": normalize_email(email),
            "password": password,
            "data": { "name": details.name, "role": details.role },
        });
        let value: Value = self
            .client
            .request(Method::POST, "/auth/v1/signup", None, &[], Some(&body))
            .await?;

        // With email confirmation enabled the response is the bare user.
        if value.get("access_token").is_some() {
            let session: Session = decode::<GoTrueSession>(value)?.into();
            Ok(SignUp {
                user: session.user.clone(),
                session: Some(session),
            })
        } else {
            Ok(SignUp {
                user: decode::<GoTrueUser>(value)?.into(),
                session: None,
            })
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        match self
            .client
            .execute(Method::POST, "/auth/v1/logout", Some(access_token), None)
            .await
        {
            // Already-invalid tokens count as signed out.
            Ok(()) | Err(SupabaseError::Api { status: 401 | 403 | 404, .. }) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        Ok(self.get_user(access_token).await?.map(|user| Session {
            access_token: access_token.to_string(),
            user,
            expires_at: None,
        }))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let result: Result<GoTrueUser, SupabaseError> = self
            .client
            .request(Method::GET, "/auth/v1/user", Some(access_token), &[], None)
            .await;
        match result {
            Ok(user) => Ok(Some(user.into())),
            Err(SupabaseError::Api { status: 401 | 403, .. }) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }
}
