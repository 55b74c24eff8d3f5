use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::admin_dto::{CreateCandidatePayload, UpdateCandidatePayload},
    error::Result,
    services::session_service::Session,
    AppState,
};

#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.list(&session.access_token).await?;
    Ok(Json(candidates))
}

#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    let created = state
        .candidate_service
        .create(&session.access_token, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    let profile = state
        .candidate_service
        .update(&session.access_token, id, payload)
        .await?;
    Ok(Json(profile))
}
