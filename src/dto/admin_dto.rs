use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::{Profile, ProfileStatus};
use crate::models::question::{ChoiceOption, ChoiceVariation};
use crate::models::result::ResultRecord;
use crate::services::insight_service::Insights;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Generated when omitted and returned once in the response.
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub assigned_test_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    /// `null` clears the assignment, an absent field leaves it untouched.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_test_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAdminPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Whole test as edited in the builder; persisted wholesale.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TestDraftPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<DraftQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftQuestion {
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    pub variation: Option<ChoiceVariation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveFlagPayload {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedAccountResponse {
    pub profile: Profile,
    /// Present only when the password was generated server side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub test_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub id: Uuid,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub test_id: Option<Uuid>,
    pub test_title: String,
}

#[derive(Debug, Serialize)]
pub struct ResultDetailResponse {
    #[serde(flatten)]
    pub summary: ResultSummary,
    pub payload: serde_json::Value,
    pub insights: Insights,
}

#[derive(Debug, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn tally<'a>(profiles: impl IntoIterator<Item = &'a Profile>) -> Self {
        let mut counts = Self {
            pending: 0,
            in_progress: 0,
            completed: 0,
        };
        for p in profiles {
            match p.status {
                ProfileStatus::Pending => counts.pending += 1,
                ProfileStatus::InProgress => counts.in_progress += 1,
                ProfileStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct RecentCompletion {
    pub candidate_id: Uuid,
    pub name: String,
    pub completion_date: Option<chrono::NaiveDate>,
    pub test_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub candidates: StatusCounts,
    pub total_candidates: usize,
    pub total_tests: usize,
    pub active_tests: usize,
    pub results: usize,
    pub recent_completions: Vec<RecentCompletion>,
    pub live_sessions: usize,
    pub open_questionnaires: usize,
}

impl ResultSummary {
    pub fn from_record(record: &ResultRecord, candidate_name: String, test_title: String) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            candidate_id: record.candidate_id,
            candidate_name,
            test_id: record.test_id,
            test_title,
        }
    }
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(de).map(Some)
}
