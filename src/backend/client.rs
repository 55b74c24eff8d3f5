use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::session_service::AuthEvent;

/// Session returned by the auth service after a password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Handle to the hosted backend: REST rows under `/rest/v1`, auth under `/auth/v1`.
///
/// The handle is stateless across users: every call carries the caller's
/// token. The primary handle announces sign-in and sign-out on the auth event
/// channel; handles made with [`BackendClient::isolated`] never do.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    events: Option<broadcast::Sender<AuthEvent>>,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        anon_key: String,
        events: broadcast::Sender<AuthEvent>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build backend HTTP client")?;
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
            anon_key,
            events: Some(events),
        })
    }

    /// Handle for account creation: same endpoint and key, no event fan-out.
    pub fn isolated(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            anon_key: self.anon_key.clone(),
            events: None,
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.events.is_none()
    }

    pub(crate) fn publish(&self, event: AuthEvent) {
        if let Some(tx) = &self.events {
            // No subscriber is fine; the registry may not be running in tests.
            let _ = tx.send(event);
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid backend path {}: {}", path, e)))
    }

    pub(crate) fn rest(&self, method: Method, table: &str, token: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(&format!("rest/v1/{}", table))?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    pub(crate) fn auth(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.endpoint(&format!("auth/v1/{}", path))?;
        let req = self
            .http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json");
        Ok(match token {
            Some(t) => req.bearer_auth(t),
            None => req.bearer_auth(&self.anon_key),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| Error::Config(format!("Invalid BACKEND_URL: {}", e)))
}

/// Reads a backend response, turning non-success statuses into [`Error::Backend`].
pub(crate) async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(Error::Backend {
            status: status.as_u16(),
            message: extract_message(&text).unwrap_or_else(|| status.to_string()),
        });
    }
    Ok(serde_json::from_str(&text)?)
}

pub(crate) async fn expect_success(resp: Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let text = resp.text().await.unwrap_or_default();
    Err(Error::Backend {
        status: status.as_u16(),
        message: extract_message(&text).unwrap_or_else(|| status.to_string()),
    })
}

/// Pulls the human readable part out of a REST or auth error body.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
