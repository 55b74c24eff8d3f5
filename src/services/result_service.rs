use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::Store;
use crate::dto::admin_dto::{ResultDetailResponse, ResultSummary};
use crate::error::{Error, Result};
use crate::models::result::ResultRecord;
use crate::services::insight_service;
use crate::utils::json::unwrap_payload;

const UNKNOWN_CANDIDATE: &str = "Unknown candidate";
const UNKNOWN_TEST: &str = "Unknown test";

#[derive(Clone)]
pub struct ResultService {
    store: Arc<dyn Store>,
}

/// Lookup tables used to put names on result rows.
pub struct Labels {
    candidates: HashMap<Uuid, String>,
    tests: HashMap<Uuid, String>,
}

impl Labels {
    pub fn summarize(&self, record: &ResultRecord) -> ResultSummary {
        let candidate = record
            .candidate_id
            .and_then(|id| self.candidates.get(&id).cloned())
            .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string());
        let test = record
            .test_id
            .and_then(|id| self.tests.get(&id).cloned())
            .unwrap_or_else(|| UNKNOWN_TEST.to_string());
        ResultSummary::from_record(record, candidate, test)
    }
}

impl ResultService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn labels(&self, token: &str) -> Result<Labels> {
        let (profiles, tests) = tokio::try_join!(
            self.store.list_profiles(token, None),
            self.store.list_tests(token),
        )?;
        Ok(Labels {
            candidates: profiles
                .iter()
                .map(|p| (p.id, p.display_name().to_string()))
                .collect(),
            tests: tests.into_iter().map(|t| (t.id, t.title)).collect(),
        })
    }

    pub async fn list(&self, token: &str) -> Result<Vec<ResultSummary>> {
        let (records, labels) =
            tokio::try_join!(self.store.list_results(token), self.labels(token))?;
        Ok(records.iter().map(|r| labels.summarize(r)).collect())
    }

    pub async fn get(&self, token: &str, id: Uuid) -> Result<ResultDetailResponse> {
        let record = self
            .store
            .get_result(token, id)
            .await?
            .ok_or_else(|| Error::NotFound("Result not found".into()))?;
        let labels = self.labels(token).await?;

        let insights = insight_service::derive(&record.payload);
        tracing::debug!(result_id = %id, shape = ?insights.shape, "result insights derived");
        Ok(ResultDetailResponse {
            summary: labels.summarize(&record),
            payload: unwrap_payload(&record.payload),
            insights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MockStore;
    use crate::models::profile::{Profile, ProfileStatus, Role};
    use crate::services::insight_service::PayloadShape;
    use serde_json::json;

    fn candidate(id: Uuid) -> Profile {
        Profile {
            id,
            name: None,
            email: "eve@example.com".into(),
            role: Role::Candidate,
            status: ProfileStatus::Completed,
            assigned_test_id: None,
            score: None,
            completion_date: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn detail_unwraps_double_encoded_payload() {
        let result_id = Uuid::new_v4();
        let candidate_id = Uuid::new_v4();
        let inner = json!({ "leadership": { "score": 4 } }).to_string();
        let stored = json!(json!(inner).to_string());

        let mut store = MockStore::new();
        store.expect_get_result().returning(move |_, id| {
            Ok(Some(ResultRecord {
                id,
                created_at: None,
                candidate_id: Some(candidate_id),
                test_id: Some(Uuid::new_v4()),
                payload: stored.clone(),
            }))
        });
        store
            .expect_list_profiles()
            .returning(move |_, _| Ok(vec![candidate(candidate_id)]));
        store.expect_list_tests().returning(|_| Ok(vec![]));

        let svc = ResultService::new(Arc::new(store));
        let detail = svc.get("tok", result_id).await.unwrap();
        assert_eq!(detail.summary.candidate_name, "eve@example.com");
        assert_eq!(detail.summary.test_title, UNKNOWN_TEST);
        assert_eq!(detail.payload, json!({ "leadership": { "score": 4 } }));
        assert_eq!(detail.insights.shape, PayloadShape::Analysis);
    }

    #[tokio::test]
    async fn missing_result_is_not_found() {
        let mut store = MockStore::new();
        store.expect_get_result().returning(|_, _| Ok(None));
        let svc = ResultService::new(Arc::new(store));
        assert!(matches!(
            svc.get("tok", Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));
    }
}
