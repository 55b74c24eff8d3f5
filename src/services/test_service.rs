use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::Store;
use crate::dto::admin_dto::{DraftQuestion, TestDraftPayload};
use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionKind};
use crate::models::test::{Test, TestRow};
use crate::utils::validation::{clean_optional, validate};

const MIN_CHOICE_OPTIONS: usize = 2;

#[derive(Clone)]
pub struct TestService {
    store: Arc<dyn Store>,
}

impl TestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Test>> {
        self.store.list_tests(token).await
    }

    pub async fn get(&self, token: &str, id: Uuid) -> Result<Test> {
        self.store
            .get_test(token, id)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".into()))
    }

    pub async fn create(&self, token: &str, draft: TestDraftPayload) -> Result<Test> {
        let row = build_row(draft)?;
        let test = self.store.insert_test(token, &row).await?;
        tracing::info!(test_id = %test.id, questions = test.questions.len(), "test created");
        Ok(test)
    }

    pub async fn update(&self, token: &str, id: Uuid, draft: TestDraftPayload) -> Result<Test> {
        let row = build_row(draft)?;
        let test = self.store.replace_test(token, id, &row).await?;
        tracing::info!(test_id = %test.id, questions = test.questions.len(), "test saved");
        Ok(test)
    }

    pub async fn set_active(&self, token: &str, id: Uuid, is_active: bool) -> Result<Test> {
        let test = self.store.set_test_active(token, id, is_active).await?;
        tracing::info!(test_id = %id, is_active, "test activation changed");
        Ok(test)
    }
}

/// Validates a builder draft and turns it into the row that gets persisted.
pub fn build_row(draft: TestDraftPayload) -> Result<TestRow> {
    validate(&draft)?;
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::BadRequest("Title is required".into()));
    }

    let mut questions = draft
        .questions
        .into_iter()
        .enumerate()
        .map(|(idx, q)| normalize_question(idx + 1, q))
        .collect::<Result<Vec<_>>>()?;
    assign_question_ids(&mut questions);

    Ok(TestRow {
        title,
        description: clean_optional(draft.description),
        is_active: draft.is_active,
        questions,
    })
}

fn normalize_question(position: usize, draft: DraftQuestion) -> Result<Question> {
    let text = draft.text.trim().to_string();
    if text.is_empty() {
        return Err(Error::BadRequest(format!(
            "Question {}: text is required",
            position
        )));
    }

    let kind = match draft.question_type.as_str() {
        "scale" => {
            if !draft.options.is_empty() {
                return Err(Error::BadRequest(format!(
                    "Question {}: scale questions cannot have options",
                    position
                )));
            }
            QuestionKind::Scale
        }
        "choice" => {
            let options: Vec<_> = draft
                .options
                .into_iter()
                .map(|mut o| {
                    o.text = o.text.trim().to_string();
                    o
                })
                .collect();
            if options.len() < MIN_CHOICE_OPTIONS {
                return Err(Error::BadRequest(format!(
                    "Question {}: at least {} options are required",
                    position, MIN_CHOICE_OPTIONS
                )));
            }
            if options.iter().any(|o| o.text.is_empty()) {
                return Err(Error::BadRequest(format!(
                    "Question {}: every option needs text",
                    position
                )));
            }
            // Answers refer to options by text.
            let mut seen = HashSet::new();
            if let Some(dup) = options.iter().find(|o| !seen.insert(o.text.as_str())) {
                return Err(Error::BadRequest(format!(
                    "Question {}: option '{}' appears more than once",
                    position, dup.text
                )));
            }
            QuestionKind::Choice {
                options,
                variation: draft.variation.unwrap_or_default(),
            }
        }
        other => {
            return Err(Error::BadRequest(format!(
                "Question {}: unknown question type '{}'",
                position, other
            )))
        }
    };

    Ok(Question {
        id: clean_optional(draft.id).unwrap_or_default(),
        text,
        category: clean_optional(draft.category),
        kind,
    })
}

/// Gives every question without an id the next free `q<n>`.
fn assign_question_ids(questions: &mut [Question]) {
    let mut taken: HashSet<String> = questions
        .iter()
        .filter(|q| !q.id.is_empty())
        .map(|q| q.id.clone())
        .collect();
    let mut next = 1;
    for q in questions.iter_mut().filter(|q| q.id.is_empty()) {
        while taken.contains(&format!("q{}", next)) {
            next += 1;
        }
        q.id = format!("q{}", next);
        taken.insert(q.id.clone());
        next += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MockStore;
    use crate::models::question::ChoiceVariation;
    use serde_json::json;

    fn draft(value: serde_json::Value) -> TestDraftPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn assigns_missing_ids_around_existing_ones() {
        let row = build_row(draft(json!({
            "title": "  Work style ",
            "questions": [
                { "text": "I plan ahead", "type": "scale" },
                { "id": "q2", "text": "I like change", "type": "scale" },
                { "text": "Pick one", "type": "choice",
                  "options": [{ "text": "A" }, { "text": "B" }] }
            ]
        })))
        .unwrap();
        let ids: Vec<_> = row.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
        assert_eq!(row.title, "Work style");
        assert_eq!(row.questions[2].variation(), Some(ChoiceVariation::Single));
    }

    #[test]
    fn rejects_blank_title() {
        let err = build_row(draft(json!({ "title": "   " }))).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn choice_needs_two_named_options() {
        let err = build_row(draft(json!({
            "title": "T",
            "questions": [{ "text": "Pick", "type": "choice", "options": [{ "text": "Only" }] }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("at least 2 options"));

        let err = build_row(draft(json!({
            "title": "T",
            "questions": [{ "text": "Pick", "type": "choice",
                            "options": [{ "text": "A" }, { "text": " " }] }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("every option needs text"));
    }

    #[test]
    fn duplicate_option_text_is_rejected() {
        let err = build_row(draft(json!({
            "title": "T",
            "questions": [{ "text": "Describe yourself", "type": "choice", "variation": "most_least",
                            "options": [{ "text": "Bold" }, { "text": "Calm" }, { "text": " Bold " }] }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("Question 1: option 'Bold' appears more than once"));
    }

    #[test]
    fn scale_with_options_is_rejected() {
        let err = build_row(draft(json!({
            "title": "T",
            "questions": [{ "text": "Rate", "type": "scale", "options": [{ "text": "A" }] }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("Question 1"));
    }

    #[test]
    fn question_text_is_required() {
        let err = build_row(draft(json!({
            "title": "T",
            "questions": [{ "text": "ok", "type": "scale" }, { "text": "", "type": "scale" }]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("Question 2: text is required"));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_store() {
        let store = MockStore::new();
        let svc = TestService::new(Arc::new(store));
        let result = svc.create("tok", draft(json!({ "title": "" }))).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn update_persists_whole_draft() {
        let id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_replace_test()
            .withf(move |token, test_id, row| {
                token == "tok" && *test_id == id && row.questions.len() == 1 && row.is_active
            })
            .times(1)
            .returning(|_, id, row| {
                Ok(Test {
                    id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    is_active: row.is_active,
                    questions: row.questions.clone(),
                    created_at: None,
                })
            });
        let svc = TestService::new(Arc::new(store));
        let test = svc
            .update(
                "tok",
                id,
                draft(json!({
                    "title": "Teamwork",
                    "is_active": true,
                    "questions": [{ "text": "I share credit", "type": "scale", "category": "Team" }]
                })),
            )
            .await
            .unwrap();
        assert_eq!(test.questions[0].id, "q1");
        assert_eq!(test.questions[0].category.as_deref(), Some("Team"));
    }
}
