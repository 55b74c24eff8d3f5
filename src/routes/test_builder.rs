use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::admin_dto::{ActiveFlagPayload, TestDraftPayload},
    error::Result,
    services::session_service::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.test_service.list(&session.access_token).await?))
}

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.test_service.get(&session.access_token, id).await?))
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<TestDraftPayload>,
) -> Result<impl IntoResponse> {
    let test = state
        .test_service
        .create(&session.access_token, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(test)))
}

#[axum::debug_handler]
pub async fn save_test(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TestDraftPayload>,
) -> Result<impl IntoResponse> {
    let test = state
        .test_service
        .update(&session.access_token, id, payload)
        .await?;
    Ok(Json(test))
}

#[axum::debug_handler]
pub async fn set_test_active(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActiveFlagPayload>,
) -> Result<impl IntoResponse> {
    let test = state
        .test_service
        .set_active(&session.access_token, id, payload.is_active)
        .await?;
    Ok(Json(test))
}
