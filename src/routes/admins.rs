use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::admin_dto::CreateAdminPayload, error::Result, services::session_service::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.admin_service.list(&session.access_token).await?))
}

#[axum::debug_handler]
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<impl IntoResponse> {
    let created = state
        .admin_service
        .create(&session.access_token, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
