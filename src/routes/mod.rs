pub mod admins;
pub mod candidates;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod questionnaire;
pub mod results;
pub mod session;
pub mod test_builder;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::{require_admin, require_candidate, require_session},
    cors::permissive_cors,
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/api/admin/dashboard", get(dashboard::overview))
        .route(
            "/api/admin/candidates",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route(
            "/api/admin/candidates/:id",
            patch(candidates::update_candidate),
        )
        .route(
            "/api/admin/tests",
            get(test_builder::list_tests).post(test_builder::create_test),
        )
        .route(
            "/api/admin/tests/:id",
            get(test_builder::get_test).put(test_builder::save_test),
        )
        .route("/api/admin/tests/:id/active", patch(test_builder::set_test_active))
        .route("/api/admin/results", get(results::list_results))
        .route("/api/admin/results/:id", get(results::get_result))
        .route(
            "/api/admin/admins",
            get(admins::list_admins).post(admins::create_admin),
        )
        .route(
            "/api/admin/export/candidates",
            get(export::export_candidates),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .layer(from_fn_with_state(
            new_rps_state(state.config.admin_rps),
            rps_middleware,
        ));

    let candidate_api = Router::new()
        .route("/api/candidate", get(questionnaire::overview))
        .route("/api/candidate/start", post(questionnaire::start))
        .route("/api/candidate/answer", put(questionnaire::answer))
        .route("/api/candidate/next", post(questionnaire::next))
        .route("/api/candidate/back", post(questionnaire::back))
        .route("/api/candidate/submit", post(questionnaire::submit))
        .route_layer(from_fn_with_state(state.clone(), require_candidate));

    let session_api = Router::new()
        .route("/api/session", get(session::current_session))
        .route("/api/auth/sign-out", post(session::sign_out))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let public_api = Router::new()
        .route("/api/auth/sign-in", post(session::sign_in))
        .merge(session_api)
        .merge(candidate_api)
        .layer(from_fn_with_state(
            new_rps_state(state.config.public_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(admin_api)
        .merge(public_api)
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
