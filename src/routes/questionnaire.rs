use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    error::Result,
    models::answer::AnswerInput,
    services::{questionnaire_service::SubmitOutcome, session_service::Session},
    AppState,
};

#[axum::debug_handler]
pub async fn overview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.questionnaire_service.overview(&session).await?))
}

#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.questionnaire_service.start(&session).await?))
}

#[axum::debug_handler]
pub async fn answer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(input): Json<AnswerInput>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state.questionnaire_service.answer(&session, input).await?,
    ))
}

#[axum::debug_handler]
pub async fn next(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.questionnaire_service.next(&session).await?))
}

#[axum::debug_handler]
pub async fn back(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.questionnaire_service.back(&session).await?))
}

#[axum::debug_handler]
pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let (status, view) = match state.questionnaire_service.submit(&session).await? {
        SubmitOutcome::Completed(view) => (StatusCode::OK, view),
        SubmitOutcome::Retry(view) => (StatusCode::BAD_GATEWAY, view),
        SubmitOutcome::Failed(view) => (StatusCode::INTERNAL_SERVER_ERROR, view),
    };
    Ok((status, Json(view)))
}
