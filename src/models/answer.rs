use serde::{Deserialize, Serialize};

use super::question::{ChoiceVariation, Question, QuestionKind, SCALE_MAX, SCALE_MIN};

/// Answer held by the questionnaire runner for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Scale(u8),
    Choice(String),
    MostLeast {
        most: Option<String>,
        least: Option<String>,
    },
}

/// A single selection sent by the client for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerInput {
    Value(u8),
    Option(String),
    Most(String),
    Least(String),
}

impl Answer {
    /// Completion predicate used before advancing or submitting.
    pub fn is_complete_for(&self, question: &Question) -> bool {
        match (&question.kind, self) {
            (QuestionKind::Scale, Answer::Scale(v)) => (SCALE_MIN..=SCALE_MAX).contains(v),
            (
                QuestionKind::Choice {
                    variation: ChoiceVariation::Single,
                    ..
                },
                Answer::Choice(option),
            ) => !option.is_empty(),
            (
                QuestionKind::Choice {
                    variation: ChoiceVariation::MostLeast,
                    ..
                },
                Answer::MostLeast {
                    most: Some(most),
                    least: Some(least),
                },
            ) => most != least,
            _ => false,
        }
    }
}

/// Applies `input` on top of `current`. Picking for one slot the option held by
/// the other slot clears the other slot.
pub fn apply_input(
    question: &Question,
    current: Option<&Answer>,
    input: AnswerInput,
) -> Result<Answer, String> {
    let is_most = matches!(input, AnswerInput::Most(_));
    match (&question.kind, input) {
        (QuestionKind::Scale, AnswerInput::Value(v)) => {
            if (SCALE_MIN..=SCALE_MAX).contains(&v) {
                Ok(Answer::Scale(v))
            } else {
                Err(format!("Scale answers must be between {} and {}", SCALE_MIN, SCALE_MAX))
            }
        }
        (
            QuestionKind::Choice {
                variation: ChoiceVariation::Single,
                ..
            },
            AnswerInput::Option(option),
        ) => {
            if question.has_option(&option) {
                Ok(Answer::Choice(option))
            } else {
                Err(format!("Unknown option: {}", option))
            }
        }
        (
            QuestionKind::Choice {
                variation: ChoiceVariation::MostLeast,
                ..
            },
            AnswerInput::Most(option) | AnswerInput::Least(option),
        ) => {
            if !question.has_option(&option) {
                return Err(format!("Unknown option: {}", option));
            }
            let (mut most, mut least) = match current {
                Some(Answer::MostLeast { most, least }) => (most.clone(), least.clone()),
                _ => (None, None),
            };
            if is_most {
                if least.as_deref() == Some(option.as_str()) {
                    least = None;
                }
                most = Some(option);
            } else {
                if most.as_deref() == Some(option.as_str()) {
                    most = None;
                }
                least = Some(option);
            }
            Ok(Answer::MostLeast { most, least })
        }
        (_, _) => Err(format!(
            "Answer does not match a {} question",
            question.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::ChoiceOption;

    fn most_least() -> Question {
        Question {
            id: "q1".into(),
            text: "Describe yourself".into(),
            category: None,
            kind: QuestionKind::Choice {
                options: ["Bold", "Calm", "Exact"]
                    .iter()
                    .map(|t| ChoiceOption {
                        text: t.to_string(),
                        value: None,
                    })
                    .collect(),
                variation: ChoiceVariation::MostLeast,
            },
        }
    }

    #[test]
    fn same_option_for_least_clears_most() {
        let q = most_least();
        let a = apply_input(&q, None, AnswerInput::Most("Bold".into())).unwrap();
        let a = apply_input(&q, Some(&a), AnswerInput::Least("Bold".into())).unwrap();
        assert_eq!(
            a,
            Answer::MostLeast {
                most: None,
                least: Some("Bold".into())
            }
        );
        assert!(!a.is_complete_for(&q));
    }

    #[test]
    fn distinct_most_and_least_complete_the_question() {
        let q = most_least();
        let a = apply_input(&q, None, AnswerInput::Least("Calm".into())).unwrap();
        let a = apply_input(&q, Some(&a), AnswerInput::Most("Exact".into())).unwrap();
        assert!(a.is_complete_for(&q));
    }

    #[test]
    fn identical_picks_never_complete() {
        let q = most_least();
        let forged = Answer::MostLeast {
            most: Some("Bold".into()),
            least: Some("Bold".into()),
        };
        assert!(!forged.is_complete_for(&q));
    }

    #[test]
    fn scale_rejects_out_of_range() {
        let q = Question {
            id: "s".into(),
            text: "Scale".into(),
            category: None,
            kind: QuestionKind::Scale,
        };
        assert!(apply_input(&q, None, AnswerInput::Value(0)).is_err());
        assert!(apply_input(&q, None, AnswerInput::Value(6)).is_err());
        assert_eq!(apply_input(&q, None, AnswerInput::Value(5)).unwrap(), Answer::Scale(5));
        assert!(apply_input(&q, None, AnswerInput::Option("x".into())).is_err());
    }
}
