use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::models::profile::Role;
use crate::services::session_service::{Session, View};
use crate::AppState;

fn unauthorized(code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": code, "view": View::Login })),
    )
        .into_response()
}

fn forbidden(session: &Session) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden", "view": session.initial_view })),
    )
        .into_response()
}

/// Pulls the bearer token out of the request and resolves it.
fn authenticate(state: &AppState, req: &Request) -> std::result::Result<Session, Response> {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };
    state.resolver.resolve(token.trim()).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        unauthorized("invalid_token")
    })
}

async fn require_role(
    state: AppState,
    role: Option<Role>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match authenticate(&state, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if let Some(role) = role {
        if session.role != role {
            tracing::warn!(
                user_id = %session.user_id,
                role = session.role.as_str(),
                path = %req.uri().path(),
                "role not allowed"
            );
            return forbidden(&session);
        }
    }
    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Any signed-in user.
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_role(state, None, req, next).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_role(state, Some(Role::Admin), req, next).await
}

pub async fn require_candidate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_role(state, Some(Role::Candidate), req, next).await
}
