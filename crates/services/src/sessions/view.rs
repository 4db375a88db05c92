use quiz_core::session::{NextQuestion, QuizSummary};
use quiz_core::{GradeResult, SessionState};
use serde::Serialize;

/// A question ready to be shown, with its quiz-set index for the answer round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub text: String,
    pub choices: Vec<String>,
    /// 1-based number of this question within the attempt.
    pub number: usize,
    pub total: usize,
}

impl QuestionView {
    pub(crate) fn new(state: &SessionState, next: NextQuestion<'_>) -> Self {
        let progress = state.progress();
        Self {
            index: next.index,
            text: next.question.text().to_owned(),
            choices: next
                .question
                .choices()
                .iter()
                .map(|c| c.text().to_owned())
                .collect(),
            number: progress.answered + 1,
            total: progress.total,
        }
    }
}

/// Everything the front end needs after an answer: verdict, score and what comes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub message: String,
    pub score: u32,
    pub finished: bool,
    pub summary: Option<QuizSummary>,
    pub next: Option<QuestionView>,
}

impl AnswerFeedback {
    pub(crate) fn new(
        result: GradeResult,
        state: &SessionState,
        next: Option<QuestionView>,
    ) -> Self {
        let message = if result.correct {
            "Correct!".to_owned()
        } else {
            format!("Incorrect. The correct answer is: {}", result.correct_answer)
        };
        Self {
            correct: result.correct,
            correct_answer: result.correct_answer,
            message,
            score: state.score(),
            finished: result.is_finished,
            summary: result.is_finished.then(|| state.summary()),
            next,
        }
    }
}
