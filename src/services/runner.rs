//! Candidate questionnaire state machine.
//!
//! A runner walks the questions of one test for one candidate. It owns the
//! collected answers and the one-shot submission latch; the questionnaire
//! service drives it and performs the network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dto::webhook_dto::{AnswerEntry, AnswerPayload, PayloadCandidate, PayloadTest};
use crate::error::{Error, Result};
use crate::models::answer::{apply_input, Answer, AnswerInput};
use crate::models::profile::{Profile, ProfileStatus};
use crate::models::question::Question;
use crate::models::test::Test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    AlreadyTaken,
    NoTestAssigned,
    InactiveTest,
}

impl BlockReason {
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::AlreadyTaken => "You have already taken this assessment.",
            BlockReason::NoTestAssigned => "No assessment has been assigned to you yet.",
            BlockReason::InactiveTest => "The assigned assessment is not available right now.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    Loading,
    Blocked(BlockReason),
    Error(String),
    InProgress,
    Submitting,
    Completed,
}

impl RunnerState {
    pub fn name(&self) -> &'static str {
        match self {
            RunnerState::Loading => "loading",
            RunnerState::Blocked(_) => "blocked",
            RunnerState::Error(_) => "error",
            RunnerState::InProgress => "in_progress",
            RunnerState::Submitting => "submitting",
            RunnerState::Completed => "completed",
        }
    }
}

/// Decides whether a candidate may enter the question flow.
///
/// Status wins over everything else: a profile that is `completed` or
/// `in-progress` is always `AlreadyTaken`, whatever its assignment.
pub fn gate(profile: &Profile, test: Option<&Test>) -> std::result::Result<(), BlockReason> {
    match profile.status {
        ProfileStatus::Completed | ProfileStatus::InProgress => {
            return Err(BlockReason::AlreadyTaken)
        }
        ProfileStatus::Pending => {}
    }
    if profile.assigned_test_id.is_none() {
        return Err(BlockReason::NoTestAssigned);
    }
    match test {
        Some(t) if t.is_active && !t.questions.is_empty() => Ok(()),
        _ => Err(BlockReason::InactiveTest),
    }
}

/// One-shot guard around the submission call. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct SubmissionLatch(Arc<AtomicBool>);

impl SubmissionLatch {
    /// Returns `true` for the first caller only, until released.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct Runner {
    profile: Profile,
    test: Test,
    index: usize,
    answers: Vec<Option<Answer>>,
    state: RunnerState,
    latch: SubmissionLatch,
    last_error: Option<String>,
}

impl Runner {
    pub fn new(profile: Profile, test: Test) -> Self {
        let answers = vec![None; test.questions.len()];
        Self {
            profile,
            test,
            index: 0,
            answers,
            state: RunnerState::InProgress,
            latch: SubmissionLatch::default(),
            last_error: None,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn latch(&self) -> &SubmissionLatch {
        &self.latch
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.test.questions.get(self.index)
    }

    pub fn current_answer(&self) -> Option<&Answer> {
        self.answers.get(self.index).and_then(|a| a.as_ref())
    }

    fn is_last(&self) -> bool {
        self.index + 1 >= self.test.questions.len()
    }

    fn current_complete(&self) -> bool {
        match (self.current_question(), self.current_answer()) {
            (Some(q), Some(a)) => a.is_complete_for(q),
            _ => false,
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match &self.state {
            RunnerState::InProgress => Ok(()),
            RunnerState::Submitting => Err(Error::Conflict("submission_in_progress".into())),
            RunnerState::Completed => Err(Error::Conflict("already_submitted".into())),
            other => Err(Error::Conflict(format!("questionnaire is {}", other.name()))),
        }
    }

    pub fn answer(&mut self, input: AnswerInput) -> Result<&Answer> {
        self.ensure_in_progress()?;
        let question = self
            .current_question()
            .ok_or_else(|| Error::BadRequest("No current question".into()))?;
        let updated = apply_input(question, self.current_answer(), input).map_err(Error::BadRequest)?;
        self.last_error = None;
        let slot = &mut self.answers[self.index];
        Ok(slot.insert(updated))
    }

    pub fn next(&mut self) -> Result<usize> {
        self.ensure_in_progress()?;
        if !self.current_complete() {
            return Err(Error::BadRequest("Answer the current question first".into()));
        }
        if self.is_last() {
            return Err(Error::BadRequest("Already at the last question".into()));
        }
        self.index += 1;
        Ok(self.index)
    }

    pub fn back(&mut self) -> Result<usize> {
        self.ensure_in_progress()?;
        self.index = self.index.saturating_sub(1);
        Ok(self.index)
    }

    pub fn can_submit(&self) -> bool {
        self.state == RunnerState::InProgress
            && self.is_last()
            && self
                .test
                .questions
                .iter()
                .zip(&self.answers)
                .all(|(q, a)| a.as_ref().map(|a| a.is_complete_for(q)).unwrap_or(false))
    }

    /// Engages the latch and moves to `Submitting`, returning the payload to deliver.
    ///
    /// A duplicate trigger while a submission is in flight is rejected without
    /// touching any state.
    pub fn begin_submit(&mut self, submitted_at: DateTime<Utc>) -> Result<AnswerPayload> {
        if self.state == RunnerState::Completed {
            return Err(Error::Conflict("already_submitted".into()));
        }
        if self.latch.is_engaged() || self.state == RunnerState::Submitting {
            return Err(Error::Conflict("submission_in_progress".into()));
        }
        self.ensure_in_progress()?;
        if !self.can_submit() {
            return Err(Error::BadRequest(
                "Answer every question before submitting".into(),
            ));
        }
        if !self.latch.try_acquire() {
            return Err(Error::Conflict("submission_in_progress".into()));
        }
        self.state = RunnerState::Submitting;
        Ok(self.build_payload(submitted_at))
    }

    /// Delivery failed: release the latch so the candidate can try again.
    pub fn submission_failed(&mut self, message: String) {
        self.latch.release();
        self.state = RunnerState::InProgress;
        self.last_error = Some(message);
    }

    /// Answers were delivered but the profile could not be closed; no retry.
    pub fn submission_aborted(&mut self, message: String) {
        self.state = RunnerState::Error(message);
    }

    pub fn submission_succeeded(&mut self) {
        self.state = RunnerState::Completed;
        self.last_error = None;
    }

    pub fn build_payload(&self, submitted_at: DateTime<Utc>) -> AnswerPayload {
        let body = self
            .test
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(q, a)| AnswerEntry {
                question_id: q.id.clone(),
                question: q.text.clone(),
                category: q.category.clone(),
                question_type: q.type_name().to_string(),
                variation: q.variation(),
                answer: a
                    .as_ref()
                    .and_then(|a| serde_json::to_value(a).ok())
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        AnswerPayload {
            candidate: PayloadCandidate {
                id: self.profile.id,
                name: self.profile.display_name().to_string(),
                email: self.profile.email.clone(),
            },
            test: PayloadTest {
                id: self.test.id,
                title: self.test.title.clone(),
            },
            submitted_at,
            body,
        }
    }

    pub fn view(&self) -> RunnerView {
        let (reason, error) = match &self.state {
            RunnerState::Blocked(r) => (Some(*r), Some(r.message().to_string())),
            RunnerState::Error(msg) => (None, Some(msg.clone())),
            _ => (None, self.last_error.clone()),
        };
        RunnerView {
            state: self.state.name(),
            reason,
            error,
            test_title: Some(self.test.title.clone()),
            index: self.index,
            total: self.test.questions.len(),
            question: self.current_question().cloned(),
            answer: self.current_answer().cloned(),
            can_advance: self.state == RunnerState::InProgress
                && self.current_complete()
                && !self.is_last(),
            can_submit: self.can_submit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerView {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_title: Option<String>,
    pub index: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    pub can_advance: bool,
    pub can_submit: bool,
}

impl RunnerView {
    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            state: RunnerState::Blocked(reason).name(),
            reason: Some(reason),
            error: Some(reason.message().to_string()),
            test_title: None,
            index: 0,
            total: 0,
            question: None,
            answer: None,
            can_advance: false,
            can_submit: false,
        }
    }

    pub fn ready(test: &Test) -> Self {
        Self {
            state: RunnerState::Loading.name(),
            reason: None,
            error: None,
            test_title: Some(test.title.clone()),
            index: 0,
            total: test.questions.len(),
            question: None,
            answer: None,
            can_advance: false,
            can_submit: false,
        }
    }
}

/// Live runners keyed by candidate id.
#[derive(Clone, Default)]
pub struct RunnerSessions {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Runner>>>>>,
}

impl RunnerSessions {
    pub async fn get(&self, user_id: Uuid) -> Option<Arc<Mutex<Runner>>> {
        self.inner.read().await.get(&user_id).cloned()
    }

    /// Registers `runner` unless one is already open for the user, in which
    /// case the existing handle is returned.
    pub async fn insert(&self, user_id: Uuid, runner: Runner) -> Arc<Mutex<Runner>> {
        self.inner
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(runner)))
            .clone()
    }

    pub async fn remove(&self, user_id: Uuid) -> bool {
        self.inner.write().await.remove(&user_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
