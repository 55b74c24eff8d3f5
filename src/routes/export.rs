use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::{
    error::Result,
    services::{export_service::XLSX_CONTENT_TYPE, session_service::Session},
    AppState,
};

/// Candidate roster and results as a styled workbook.
#[axum::debug_handler]
pub async fn export_candidates(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let buffer = state
        .export_service
        .candidates_workbook(&session.access_token)
        .await?;
    let filename = format!("candidates_{}.xlsx", chrono::Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
