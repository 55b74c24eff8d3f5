use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::client::{expect_success, read_json, AuthSession, AuthUser, BackendClient};
use crate::error::{Error, Result};
use crate::models::profile::Role;
use crate::services::session_service::AuthEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_out(&self, access_token: &str, user_id: Uuid) -> Result<()>;

    /// Creates a login without disturbing the caller's own session.
    async fn create_account(&self, account: &NewAccount) -> Result<AuthUser>;
}

#[async_trait]
impl AuthApi for BackendClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let resp = self
            .auth(Method::POST, "token?grant_type=password", None)?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: AuthSession = read_json(resp).await.map_err(translate_auth_error)?;

        let role = Role::from_metadata(
            session
                .user
                .user_metadata
                .get("role")
                .and_then(|r| r.as_str()),
        );
        self.publish(AuthEvent::SignedIn {
            user_id: session.user.id,
            role,
        });
        tracing::info!(user_id = %session.user.id, role = role.as_str(), "signed in");
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str, user_id: Uuid) -> Result<()> {
        let resp = self
            .auth(Method::POST, "logout", Some(access_token))?
            .send()
            .await?;
        // An already-expired token still counts as signed out locally.
        if let Err(err) = expect_success(resp).await {
            tracing::warn!(user_id = %user_id, error = %err, "remote sign-out failed");
        }
        self.publish(AuthEvent::SignedOut { user_id });
        Ok(())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<AuthUser> {
        let isolated = self.isolated();
        let resp = isolated
            .auth(Method::POST, "signup", None)?
            .json(&json!({
                "email": account.email,
                "password": account.password,
                "data": { "role": account.role.as_str(), "name": account.name },
            }))
            .send()
            .await?;
        let body: JsonValue = read_json(resp).await.map_err(translate_auth_error)?;
        let user = parse_signup_user(body)?;
        tracing::info!(user_id = %user.id, role = account.role.as_str(), "account created");
        Ok(user)
    }
}

/// Sign-up answers with a bare user when confirmation is pending, or with a
/// full session when it is not.
fn parse_signup_user(body: JsonValue) -> Result<AuthUser> {
    let user = match body.get("user") {
        Some(u) if u.is_object() => u.clone(),
        _ => body,
    };
    serde_json::from_value(user)
        .map_err(|e| Error::Internal(format!("Unexpected sign-up response: {}", e)))
}

const AUTH_MESSAGES: &[(&str, &str)] = &[
    ("Invalid login credentials", "Incorrect email or password."),
    ("User already registered", "An account with this email already exists."),
    ("Email not confirmed", "Please confirm your email address before signing in."),
    ("rate limit", "Too many attempts. Please wait a moment and try again."),
];

/// Rewrites known auth-service messages into user-facing text.
pub fn translate_auth_message(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    AUTH_MESSAGES
        .iter()
        .find(|(needle, _)| lowered.contains(&needle.to_lowercase()))
        .map(|(_, friendly)| friendly.to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn translate_auth_error(err: Error) -> Error {
    match err {
        Error::Backend { status, message } => Error::Backend {
            status,
            message: translate_auth_message(&message),
        },
        other => other,
    }
}
