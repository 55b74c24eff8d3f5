use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::{
    dto::auth_dto::{SessionResponse, SignInPayload, SignInResponse},
    error::Result,
    services::session_service::Session,
    utils::validation::validate,
    AppState,
};

#[axum::debug_handler]
pub async fn current_session(Extension(session): Extension<Session>) -> Result<impl IntoResponse> {
    Ok(Json(SessionResponse::from(session)))
}

#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let auth = state
        .auth
        .sign_in(payload.email.trim(), &payload.password)
        .await?;
    let session = state.resolver.resolve(&auth.access_token)?;
    Ok(Json(SignInResponse {
        access_token: auth.access_token,
        refresh_token: auth.refresh_token,
        expires_in: auth.expires_in,
        session: session.into(),
    }))
}

#[axum::debug_handler]
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    state
        .auth
        .sign_out(&session.access_token, session.user_id)
        .await?;
    Ok((StatusCode::OK, Json(json!({ "view": "login" }))))
}
