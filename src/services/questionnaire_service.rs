use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backend::Store;
use crate::error::{Error, Result};
use crate::models::answer::AnswerInput;
use crate::models::profile::{Profile, ProfilePatch, ProfileStatus};
use crate::models::test::Test;
use crate::services::runner::{gate, BlockReason, Runner, RunnerSessions, RunnerView};
use crate::services::session_service::Session;
use crate::services::webhook_service::AnswerSink;
use crate::utils::time;

/// How a submission ended, so the route can pick a status code.
#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(RunnerView),
    /// Delivery failed; the candidate may submit again.
    Retry(RunnerView),
    /// Answers were delivered but the profile stayed open.
    Failed(RunnerView),
}

#[derive(Clone)]
pub struct QuestionnaireService {
    store: Arc<dyn Store>,
    sink: Arc<dyn AnswerSink>,
    runners: RunnerSessions,
}

impl QuestionnaireService {
    pub fn new(store: Arc<dyn Store>, sink: Arc<dyn AnswerSink>, runners: RunnerSessions) -> Self {
        Self {
            store,
            sink,
            runners,
        }
    }

    async fn load(&self, session: &Session) -> Result<(Profile, Option<Test>)> {
        let profile = self
            .store
            .get_profile(&session.access_token, session.user_id)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".into()))?;
        let test = match profile.assigned_test_id {
            Some(test_id) => self.store.get_test(&session.access_token, test_id).await?,
            None => None,
        };
        Ok((profile, test))
    }

    async fn runner(&self, session: &Session) -> Result<Arc<Mutex<Runner>>> {
        self.runners
            .get(session.user_id)
            .await
            .ok_or_else(|| Error::NotFound("The questionnaire has not been started".into()))
    }

    /// Current screen for the candidate, without side effects.
    pub async fn overview(&self, session: &Session) -> Result<RunnerView> {
        if let Some(handle) = self.runners.get(session.user_id).await {
            return Ok(handle.lock().await.view());
        }
        let (profile, test) = self.load(session).await?;
        Ok(match (gate(&profile, test.as_ref()), test) {
            (Ok(()), Some(test)) => RunnerView::ready(&test),
            (Err(reason), _) => RunnerView::blocked(reason),
            (Ok(()), None) => RunnerView::blocked(BlockReason::InactiveTest),
        })
    }

    /// Opens the question flow. The profile row is only written on a
    /// delivered submission; until then the runner is the in-progress state.
    pub async fn start(&self, session: &Session) -> Result<RunnerView> {
        if let Some(handle) = self.runners.get(session.user_id).await {
            return Ok(handle.lock().await.view());
        }
        let (profile, test) = self.load(session).await?;
        if let Err(reason) = gate(&profile, test.as_ref()) {
            tracing::info!(user_id = %session.user_id, reason = ?reason, "questionnaire blocked");
            return Ok(RunnerView::blocked(reason));
        }
        let Some(test) = test else {
            return Ok(RunnerView::blocked(BlockReason::InactiveTest));
        };

        tracing::info!(user_id = %session.user_id, test_id = %test.id, "questionnaire started");
        let handle = self.runners.insert(session.user_id, Runner::new(profile, test)).await;
        let view = handle.lock().await.view();
        Ok(view)
    }

    pub async fn answer(&self, session: &Session, input: AnswerInput) -> Result<RunnerView> {
        let handle = self.runner(session).await?;
        let mut runner = handle.lock().await;
        runner.answer(input)?;
        Ok(runner.view())
    }

    pub async fn next(&self, session: &Session) -> Result<RunnerView> {
        let handle = self.runner(session).await?;
        let mut runner = handle.lock().await;
        runner.next()?;
        Ok(runner.view())
    }

    pub async fn back(&self, session: &Session) -> Result<RunnerView> {
        let handle = self.runner(session).await?;
        let mut runner = handle.lock().await;
        runner.back()?;
        Ok(runner.view())
    }

    /// Delivers the answers, then closes the profile.
    ///
    /// The runner lock is released while the webhook call is in flight; the
    /// submission latch is what keeps a second trigger from sending again.
    pub async fn submit(&self, session: &Session) -> Result<SubmitOutcome> {
        let handle = self.runner(session).await?;
        let payload = {
            let mut runner = handle.lock().await;
            runner.begin_submit(time::now())?
        };

        if let Err(err) = self.sink.deliver(&payload).await {
            tracing::warn!(user_id = %session.user_id, error = %err, "answer delivery failed");
            let mut runner = handle.lock().await;
            runner.submission_failed(
                "We could not submit your answers. Please try again.".to_string(),
            );
            return Ok(SubmitOutcome::Retry(runner.view()));
        }

        let patch = ProfilePatch {
            status: Some(ProfileStatus::Completed),
            completion_date: Some(time::today()),
            ..Default::default()
        };
        let updated = self
            .store
            .update_profile(&session.access_token, session.user_id, &patch)
            .await;

        let mut runner = handle.lock().await;
        match updated {
            Ok(_) => {
                runner.submission_succeeded();
                let view = runner.view();
                drop(runner);
                // The profile row now gates the candidate as already taken.
                self.runners.remove(session.user_id).await;
                tracing::info!(user_id = %session.user_id, "questionnaire completed");
                Ok(SubmitOutcome::Completed(view))
            }
            Err(err) => {
                tracing::error!(user_id = %session.user_id, error = %err, "profile close failed after delivery");
                runner.submission_aborted(
                    "Your answers were received but your profile could not be updated. Please contact the administrator."
                        .to_string(),
                );
                Ok(SubmitOutcome::Failed(runner.view()))
            }
        }
    }
}
