use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const SCALE_MIN: u8 = 1;
pub const SCALE_MAX: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Scale,
    Choice {
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(default)]
        variation: ChoiceVariation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceVariation {
    #[default]
    Single,
    MostLeast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    /// Weight or profile tag used by the downstream analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

impl Question {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Scale => "scale",
            QuestionKind::Choice { .. } => "choice",
        }
    }

    pub fn variation(&self) -> Option<ChoiceVariation> {
        match &self.kind {
            QuestionKind::Scale => None,
            QuestionKind::Choice { variation, .. } => Some(*variation),
        }
    }

    pub fn has_option(&self, text: &str) -> bool {
        match &self.kind {
            QuestionKind::Scale => false,
            QuestionKind::Choice { options, .. } => options.iter().any(|o| o.text == text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_embedded_question_json() {
        let raw = json!([
            { "id": "q1", "text": "I enjoy leading", "category": "Leadership", "type": "scale" },
            {
                "id": "q2",
                "text": "Pick one",
                "type": "choice",
                "variation": "most_least",
                "options": [ { "text": "Bold", "value": "D" }, { "text": "Calm" } ]
            }
        ]);
        let questions: Vec<Question> = serde_json::from_value(raw).unwrap();
        assert_eq!(questions[0].kind, QuestionKind::Scale);
        assert_eq!(questions[1].variation(), Some(ChoiceVariation::MostLeast));
        assert!(questions[1].has_option("Calm"));
        assert!(!questions[1].has_option("Loud"));
    }

    #[test]
    fn choice_variation_defaults_to_single() {
        let q: Question = serde_json::from_value(json!({
            "text": "Pick", "type": "choice", "options": [{ "text": "A" }]
        }))
        .unwrap();
        assert_eq!(q.variation(), Some(ChoiceVariation::Single));
        assert_eq!(q.id, "");
    }
}
