use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::session_service::{views_for, Session};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInPayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    pub views: &'static [&'static str],
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            views: views_for(session.role),
            session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub session: SessionResponse,
}
