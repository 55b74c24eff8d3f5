use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{error::Result, services::session_service::Session, AppState};

#[axum::debug_handler]
pub async fn overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let dashboard = state
        .dashboard_service
        .overview(&session.access_token)
        .await?;
    Ok(Json(dashboard))
}
