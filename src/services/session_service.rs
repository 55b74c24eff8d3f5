use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::profile::Role;
use crate::services::runner::RunnerSessions;

/// Audience the backend stamps on user access tokens.
pub const TOKEN_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid, role: Role },
    SignedOut { user_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Dashboard,
    Questionnaire,
}

/// Views the admin shell can navigate between.
pub const ADMIN_VIEWS: &[&str] = &["dashboard", "candidates", "tests", "results", "admins"];
const CANDIDATE_VIEWS: &[&str] = &["questionnaire"];

pub fn views_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN_VIEWS,
        Role::Candidate => CANDIDATE_VIEWS,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub initial_view: View,
    #[serde(skip)]
    pub access_token: String,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone)]
pub struct SessionResolver {
    key: DecodingKey,
    validation: Validation,
}

impl SessionResolver {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[TOKEN_AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Reads the caller's token and derives role and starting view.
    pub fn resolve(&self, token: &str) -> Result<Session> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| Error::Unauthorized(format!("invalid_token: {}", e)))?;
        let claims = data.claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("invalid_subject".into()))?;
        let role = Role::from_metadata(claims.user_metadata.get("role").and_then(|r| r.as_str()));
        let name = claims
            .user_metadata
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string);

        Ok(Session {
            user_id,
            email: claims.email,
            name,
            role,
            initial_view: initial_view(role),
            access_token: token.to_string(),
        })
    }
}

pub fn initial_view(role: Role) -> View {
    match role {
        Role::Admin => View::Dashboard,
        Role::Candidate => View::Questionnaire,
    }
}

/// Keeps per-user in-memory state in step with sign-in and sign-out.
#[derive(Clone)]
pub struct SessionRegistry {
    roles: Arc<RwLock<HashMap<Uuid, Role>>>,
    runners: RunnerSessions,
}

impl SessionRegistry {
    pub fn new(runners: RunnerSessions) -> Self {
        Self {
            roles: Arc::new(RwLock::new(HashMap::new())),
            runners,
        }
    }

    pub async fn apply(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn { user_id, role } => {
                self.roles.write().await.insert(user_id, role);
                tracing::debug!(user_id = %user_id, role = role.as_str(), "session registered");
            }
            AuthEvent::SignedOut { user_id } => {
                self.roles.write().await.remove(&user_id);
                let dropped = self.runners.remove(user_id).await;
                tracing::debug!(user_id = %user_id, dropped_runner = dropped, "session cleared");
            }
        }
    }

    /// Follows the auth event channel for the lifetime of the process.
    pub async fn run(self, mut rx: broadcast::Receiver<AuthEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => self.apply(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    pub async fn role_of(&self, user_id: Uuid) -> Option<Role> {
        self.roles.read().await.get(&user_id).copied()
    }

    /// Open questionnaires: started, not completed, not dropped by sign-out.
    pub async fn open_questionnaires(&self) -> usize {
        self.runners.len().await
    }

    pub async fn active_sessions(&self) -> usize {
        self.roles.read().await.len()
    }
}
