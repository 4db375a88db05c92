use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::choice::Choice;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("choice text cannot be empty")]
    EmptyChoiceText,

    #[error("question must have at least one choice")]
    NoChoices,

    #[error("question must have at least one correct choice")]
    NoCorrectChoice,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question with its ordered choices.
///
/// Always holds at least one choice, and at least one of them is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    text: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct RawQuestion {
    text: String,
    choices: Vec<Choice>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Question::new(raw.text, raw.choices)
    }
}

impl Question {
    /// Creates a question with trimmed text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` for blank text, `QuestionError::NoChoices`
    /// when `choices` is empty, and `QuestionError::NoCorrectChoice` when none is correct.
    pub fn new(text: impl Into<String>, choices: Vec<Choice>) -> Result<Self, QuestionError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if choices.is_empty() {
            return Err(QuestionError::NoChoices);
        }
        if !choices.iter().any(Choice::is_correct) {
            return Err(QuestionError::NoCorrectChoice);
        }

        Ok(Self {
            text: trimmed.to_owned(),
            choices,
        })
    }

    // Accessors
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// First choice marked correct, in source order.
    #[must_use]
    pub fn first_correct(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct())
    }

    /// Display text of the first correct choice.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.first_correct().map_or("", Choice::text)
    }

    /// True when `submitted` matches any correct choice.
    #[must_use]
    pub fn accepts(&self, submitted: &str) -> bool {
        self.choices
            .iter()
            .any(|c| c.is_correct() && c.matches(submitted))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn capital_question() -> Question {
        Question::new(
            " Capital of France? ",
            vec![
                Choice::incorrect("London").unwrap(),
                Choice::correct("Paris").unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_trims_text() {
        assert_eq!(capital_question().text(), "Capital of France?");
    }

    #[test]
    fn new_rejects_invalid_shapes() {
        let err = Question::new("  ", vec![Choice::correct("x").unwrap()]).unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);

        let err = Question::new("Q", Vec::new()).unwrap_err();
        assert_eq!(err, QuestionError::NoChoices);

        let err = Question::new("Q", vec![Choice::incorrect("x").unwrap()]).unwrap_err();
        assert_eq!(err, QuestionError::NoCorrectChoice);
    }

    #[test]
    fn accepts_any_correct_choice() {
        let question = Question::new(
            "Pick a prime",
            vec![
                Choice::correct("2").unwrap(),
                Choice::incorrect("4").unwrap(),
                Choice::correct("3").unwrap(),
            ],
        )
        .unwrap();

        assert!(question.accepts("2"));
        assert!(question.accepts(" 3 "));
        assert!(!question.accepts("4"));
        assert_eq!(question.correct_answer(), "2");
    }

    #[test]
    fn accepts_never_matches_incorrect_choice_text() {
        let question = capital_question();
        assert!(!question.accepts("london"));
        assert!(question.accepts("PARIS"));
    }

    #[test]
    fn deserialize_enforces_invariants() {
        let json = r#"{"text":"Q","choices":[{"text":"a","is_correct":false}]}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());

        let json = r#"{"text":"Q","choices":[{"text":"a","is_correct":true}]}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.correct_answer(), "a");
    }
}
