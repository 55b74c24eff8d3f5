pub mod backend;
pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::backend::{AuthApi, Store};
use crate::config::Config;
use crate::services::{
    admin_service::AdminService, candidate_service::CandidateService,
    dashboard_service::DashboardService, export_service::ExportService,
    questionnaire_service::QuestionnaireService, result_service::ResultService,
    runner::RunnerSessions, session_service::{SessionRegistry, SessionResolver},
    test_service::TestService, webhook_service::AnswerSink,
};

pub use crate::routes::build_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: SessionResolver,
    pub registry: SessionRegistry,
    pub auth: Arc<dyn AuthApi>,
    pub candidate_service: CandidateService,
    pub admin_service: AdminService,
    pub test_service: TestService,
    pub result_service: ResultService,
    pub dashboard_service: DashboardService,
    pub export_service: ExportService,
    pub questionnaire_service: QuestionnaireService,
}

impl AppState {
    /// Wires services around the backend ports. The registry shares the
    /// runner table so sign-out can drop an unfinished questionnaire.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        auth: Arc<dyn AuthApi>,
        sink: Arc<dyn AnswerSink>,
    ) -> Self {
        let runners = RunnerSessions::default();
        let registry = SessionRegistry::new(runners.clone());
        let result_service = ResultService::new(store.clone());

        Self {
            resolver: SessionResolver::new(&config.backend_jwt_secret),
            config: Arc::new(config),
            registry: registry.clone(),
            auth: auth.clone(),
            candidate_service: CandidateService::new(store.clone(), auth.clone()),
            admin_service: AdminService::new(store.clone(), auth),
            test_service: TestService::new(store.clone()),
            dashboard_service: DashboardService::new(store.clone(), registry),
            export_service: ExportService::new(store.clone(), result_service.clone()),
            result_service,
            questionnaire_service: QuestionnaireService::new(store, sink, runners),
        }
    }
}
