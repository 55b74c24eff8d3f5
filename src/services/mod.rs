pub mod admin_service;
pub mod candidate_service;
pub mod dashboard_service;
pub mod export_service;
pub mod insight_service;
pub mod questionnaire_service;
pub mod result_service;
pub mod runner;
pub mod session_service;
pub mod test_service;
pub mod webhook_service;
