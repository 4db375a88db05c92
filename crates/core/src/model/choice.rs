use serde::{Deserialize, Serialize};

use super::normalize_answer;
use super::question::QuestionError;

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChoice")]
pub struct Choice {
    text: String,
    is_correct: bool,
}

#[derive(Deserialize)]
struct RawChoice {
    text: String,
    is_correct: bool,
}

impl TryFrom<RawChoice> for Choice {
    type Error = QuestionError;

    fn try_from(raw: RawChoice) -> Result<Self, Self::Error> {
        Choice::new(raw.text, raw.is_correct)
    }
}

impl Choice {
    /// Creates a choice with trimmed text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyChoiceText` if the text is empty or whitespace-only.
    pub fn new(text: impl Into<String>, is_correct: bool) -> Result<Self, QuestionError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyChoiceText);
        }
        Ok(Self {
            text: trimmed.to_owned(),
            is_correct,
        })
    }

    /// Shorthand for a choice marked correct.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyChoiceText` if the text is blank.
    pub fn correct(text: impl Into<String>) -> Result<Self, QuestionError> {
        Self::new(text, true)
    }

    /// Shorthand for a choice marked incorrect.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyChoiceText` if the text is blank.
    pub fn incorrect(text: impl Into<String>) -> Result<Self, QuestionError> {
        Self::new(text, false)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// True when `submitted` names this choice, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        normalize_answer(&self.text) == normalize_answer(submitted)
    }
}
