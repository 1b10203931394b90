//! HTTP client for the hosted backend: GoTrue under `/auth/v1`, PostgREST
//! under `/rest/v1`.
//!
//! Every call carries the project's public `apikey`; calls made on behalf
//! of a signed-in user carry the user's access token as the bearer so the
//! backend's row-level security applies.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Shared client. Cheap to clone (reqwest pools connections internally).
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SupabaseError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http,
        })
    }

    /// Send a request and decode the JSON body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, SupabaseError> {
        let bytes = self.send(method, path, access_token, query, body, None).await?;
        serde_json::from_slice(&bytes).map_err(|e| SupabaseError::Decode(e.to_string()))
    }

    /// Send a request whose response body is ignored (`Prefer: return=minimal`).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<(), SupabaseError> {
        self.send(method, path, access_token, &[], body, Some("return=minimal"))
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&Value>,
        prefer: Option<&str>,
    ) -> Result<Vec<u8>, SupabaseError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers(access_token, prefer)?)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "Backend request");
        let response = request
            .send()
            .await
            .map_err(|e| SupabaseError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SupabaseError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = extract_error_message(status, &bytes);
            tracing::debug!(%method, path, status = status.as_u16(), message, "Backend error");
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }

    fn headers(
        &self,
        access_token: Option<&str>,
        prefer: Option<&str>,
    ) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();
        let apikey = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| SupabaseError::Config(format!("apikey: {e}")))?;
        headers.insert("apikey", apikey);

        let bearer = access_token.unwrap_or(&self.anon_key);
        let auth = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|e| SupabaseError::Config(format!("authorization: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(prefer) = prefer {
            let value = HeaderValue::from_str(prefer)
                .map_err(|e| SupabaseError::Config(format!("prefer: {e}")))?;
            headers.insert("Prefer", value);
        }
        Ok(headers)
    }
}

/// Pull the human-readable message out of a GoTrue or PostgREST error body.
fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    if let Some(Value::Object(map)) = parsed {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.is_empty() {
                    return message.clone();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-process HTTP stub standing in for the hosted backend.

    use std::net::SocketAddr;

    use axum::Router;

    /// Serve `router` on an ephemeral localhost port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap as AxumHeaders;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn error_message_prefers_known_keys() {
        let body = br#"{"code":"PGRST116","message":"JSON object requested, multiple rows returned"}"#;
        assert_eq!(
            extract_error_message(StatusCode::NOT_ACCEPTABLE, body),
            "JSON object requested, multiple rows returned"
        );
        let body = br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, body),
            "Invalid login credentials"
        );
        assert_eq!(extract_error_message(StatusCode::BAD_GATEWAY, b""), "Bad Gateway");
    }

    #[tokio::test]
    async fn request_sends_apikey_and_bearer() {
        let router = Router::new().route(
            "/rest/v1/echo",
            get(|headers: AxumHeaders| async move {
                Json(json!({
                    "apikey": headers.get("apikey").and_then(|v| v.to_str().ok()),
                    "auth": headers.get("authorization").and_then(|v| v.to_str().ok()),
                }))
            }),
        );
        let base = stub::serve(router).await;
        let client = SupabaseClient::new(&base, "anon-key").unwrap();

        let echoed: Value = client
            .request(Method::GET, "/rest/v1/echo", Some("user-token"), &[], None)
            .await
            .unwrap();
        assert_eq!(echoed["apikey"], "anon-key");
        assert_eq!(echoed["auth"], "Bearer user-token");

        let anonymous: Value = client
            .request(Method::GET, "/rest/v1/echo", None, &[], None)
            .await
            .unwrap();
        assert_eq!(anonymous["auth"], "Bearer anon-key");
    }

    #[tokio::test]
    async fn api_errors_carry_status_and_message() {
        let router = Router::new().route(
            "/rest/v1/broken",
            get(|| async {
                (
                    axum::http::StatusCode::FORBIDDEN,
                    Json(json!({"message": "permission denied for table profiles"})),
                )
            }),
        );
        let base = stub::serve(router).await;
        let client = SupabaseClient::new(&base, "anon-key").unwrap();

        let err = client
            .request::<Value>(Method::GET, "/rest/v1/broken", None, &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::Api { status: 403, .. }));
        assert_eq!(err.to_string(), "permission denied for table profiles");
    }
}
