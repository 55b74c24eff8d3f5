use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::Store;
use crate::dto::admin_dto::{DashboardResponse, RecentCompletion, StatusCounts};
use crate::error::Result;
use crate::models::profile::{ProfileStatus, Role};
use crate::services::session_service::SessionRegistry;

const RECENT_COMPLETIONS: usize = 5;

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
    registry: SessionRegistry,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>, registry: SessionRegistry) -> Self {
        Self { store, registry }
    }

    pub async fn overview(&self, token: &str) -> Result<DashboardResponse> {
        let (candidates, tests, results) = tokio::try_join!(
            self.store.list_profiles(token, Some(Role::Candidate)),
            self.store.list_tests(token),
            self.store.list_results(token),
        )?;
        let titles: HashMap<_, _> = tests.iter().map(|t| (t.id, t.title.clone())).collect();

        let mut completed: Vec<_> = candidates
            .iter()
            .filter(|p| p.status == ProfileStatus::Completed)
            .collect();
        completed.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));
        let recent_completions = completed
            .into_iter()
            .take(RECENT_COMPLETIONS)
            .map(|p| RecentCompletion {
                candidate_id: p.id,
                name: p.display_name().to_string(),
                completion_date: p.completion_date,
                test_title: p.assigned_test_id.and_then(|id| titles.get(&id).cloned()),
            })
            .collect();

        Ok(DashboardResponse {
            candidates: StatusCounts::tally(&candidates),
            total_candidates: candidates.len(),
            total_tests: tests.len(),
            active_tests: tests.iter().filter(|t| t.is_active).count(),
            results: results.len(),
            recent_completions,
            live_sessions: self.registry.active_sessions().await,
            open_questionnaires: self.registry.open_questionnaires().await,
        })
    }
}
