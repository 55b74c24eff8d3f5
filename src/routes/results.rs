use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{error::Result, services::session_service::Session, AppState};

#[axum::debug_handler]
pub async fn list_results(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.result_service.list(&session.access_token).await?))
}

#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.result_service.get(&session.access_token, id).await?))
}
