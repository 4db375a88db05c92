mod choice;
mod ids;
mod question;
mod quiz_set;

pub use choice::Choice;
pub use ids::{ChoiceId, ParseIdError, QuestionId, QuizId};
pub use question::{Question, QuestionError};
pub use quiz_set::{MAX_QUIZ_QUESTIONS, QuizSet, QuizSetError};

/// Canonical form used when comparing a submitted answer with a choice.
pub(crate) fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}
