use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::model::{MAX_QUIZ_QUESTIONS, Question, QuizSet};
use crate::parser;
use crate::random::RandomSource;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot start a quiz without questions")]
    EmptyQuiz,

    #[error("question index {index} is out of range for a quiz of {len} questions")]
    InvalidIndex { index: usize, len: usize },

    #[error("score {score} exceeds the {answered} answered questions")]
    InconsistentScore { score: u32, answered: usize },
}

//
// ─── VIEW TYPES ────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz attempt. `Idle` means no session exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    InProgress,
    Finished,
}

/// The question to show next, with its position in the quiz set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextQuestion<'a> {
    pub index: usize,
    pub question: &'a Question,
}

/// Outcome of grading one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeResult {
    pub correct: bool,
    pub correct_answer: String,
    pub is_finished: bool,
}

/// Aggregated view of session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: u32,
    pub is_finished: bool,
}

/// Final tally shown once a quiz is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub score: u32,
    pub total: usize,
    pub errors: usize,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// One user's in-progress quiz attempt.
///
/// Owns its own copy of the questions. Every grading call records the index as
/// answered; only the first call for an index can award a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionSnapshot")]
pub struct SessionState {
    questions: QuizSet,
    answered: BTreeSet<usize>,
    score: u32,
}

#[derive(Deserialize)]
struct SessionSnapshot {
    questions: QuizSet,
    answered: BTreeSet<usize>,
    score: u32,
}

impl TryFrom<SessionSnapshot> for SessionState {
    type Error = SessionError;

    fn try_from(snapshot: SessionSnapshot) -> Result<Self, Self::Error> {
        let mut state = SessionState::start(snapshot.questions)?;
        let len = state.questions.len();
        if let Some(&index) = snapshot.answered.iter().find(|&&i| i >= len) {
            return Err(SessionError::InvalidIndex { index, len });
        }
        if usize::try_from(snapshot.score).map_or(true, |s| s > snapshot.answered.len()) {
            return Err(SessionError::InconsistentScore {
                score: snapshot.score,
                answered: snapshot.answered.len(),
            });
        }
        state.answered = snapshot.answered;
        state.score = snapshot.score;
        Ok(state)
    }
}

impl SessionState {
    /// Starts a fresh attempt: nothing answered, score zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuiz` if `questions` is empty.
    pub fn start(questions: QuizSet) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }
        Ok(Self {
            questions,
            answered: BTreeSet::new(),
            score: 0,
        })
    }

    /// Parses quiz text, caps it to a quiz set and starts a session over it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Format` when the text is malformed.
    pub fn from_text(raw_text: &str, random: &mut RandomSource) -> Result<Self, Error> {
        let parsed = parser::parse(raw_text)?;
        let set = QuizSet::sample(parsed, random);
        Ok(Self::start(set)?)
    }

    /// Clears answers and score, keeping the same questions.
    pub fn restart(&mut self) {
        self.answered.clear();
        self.score = 0;
    }

    // Accessors
    #[must_use]
    pub fn questions(&self) -> &QuizSet {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answered_indices(&self) -> &BTreeSet<usize> {
        &self.answered
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.answered.contains(&index)
    }

    /// Number of distinct answers needed to finish.
    #[must_use]
    pub fn target(&self) -> usize {
        self.questions.len().min(MAX_QUIZ_QUESTIONS)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.answered.len() >= self.target()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_finished() {
            SessionPhase::Finished
        } else {
            SessionPhase::InProgress
        }
    }

    /// Picks an unanswered question uniformly at random.
    ///
    /// Returns `None` once the session is finished.
    #[must_use]
    pub fn next_question(&self, random: &mut RandomSource) -> Option<NextQuestion<'_>> {
        if self.is_finished() {
            return None;
        }
        let remaining: Vec<usize> = (0..self.questions.len())
            .filter(|i| !self.answered.contains(i))
            .collect();
        let index = remaining[random.pick_index(remaining.len())?];
        let question = self.questions.get(index)?;
        Some(NextQuestion { index, question })
    }

    /// Grades `submitted` against the question at `index`.
    ///
    /// The index is marked answered on its first grading; the score only moves if
    /// that first answer is correct.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidIndex` if `index` is outside the quiz set.
    pub fn grade(&mut self, index: usize, submitted: &str) -> Result<GradeResult, SessionError> {
        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::InvalidIndex {
                index,
                len: self.questions.len(),
            })?;

        let correct = question.accepts(submitted);
        let correct_answer = question.correct_answer().to_owned();

        if self.answered.insert(index) && correct {
            self.score = self.score.saturating_add(1);
        }

        Ok(GradeResult {
            correct,
            correct_answer,
            is_finished: self.is_finished(),
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.target();
        let answered = self.answered.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            score: self.score,
            is_finished: self.is_finished(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> QuizSummary {
        let total = self.target();
        let score = usize::try_from(self.score).unwrap_or(usize::MAX);
        QuizSummary {
            score: self.score,
            total,
            errors: total.saturating_sub(score),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Choice;
    use std::collections::HashSet;

    fn question(i: usize) -> Question {
        Question::new(
            format!("Question {i}"),
            vec![
                Choice::incorrect(format!("wrong {i}")).unwrap(),
                Choice::correct(format!("Answer {i}")).unwrap(),
            ],
        )
        .unwrap()
    }

    fn state_with(count: usize, random: &mut RandomSource) -> SessionState {
        let questions = (0..count).map(question).collect();
        SessionState::start(QuizSet::sample(questions, random)).unwrap()
    }

    #[test]
    fn start_rejects_empty_quiz() {
        let err = SessionState::start(QuizSet::default()).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuiz);
    }

    #[test]
    fn fresh_session_is_in_progress() {
        let state = state_with(3, &mut RandomSource::seeded(1));
        assert_eq!(state.score(), 0);
        assert!(state.answered_indices().is_empty());
        assert_eq!(state.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn next_question_never_repeats() {
        let mut random = RandomSource::seeded(21);
        let mut state = state_with(12, &mut random);
        let mut seen = HashSet::new();

        while let Some(next) = state.next_question(&mut random).map(|n| n.index) {
            assert!(!state.is_answered(next));
            assert!(seen.insert(next));
            state.grade(next, "nope").unwrap();
        }

        assert_eq!(seen.len(), 12);
        assert!(state.is_finished());
        assert_eq!(state.phase(), SessionPhase::Finished);
    }

    #[test]
    fn forty_five_questions_finish_after_thirty() {
        let mut random = RandomSource::seeded(45);
        let mut state = state_with(45, &mut random);
        assert_eq!(state.questions().len(), 30);

        let mut graded = 0;
        while let Some(next) = state.next_question(&mut random).map(|n| n.index) {
            graded += 1;
            let result = state.grade(next, "whatever").unwrap();
            assert_eq!(result.is_finished, graded == 30);
        }
        assert_eq!(graded, 30);
    }

    #[test]
    fn grade_is_case_and_whitespace_insensitive() {
        let mut random = RandomSource::seeded(2);
        let mut padded = state_with(2, &mut random);
        let mut plain = padded.clone();

        let a = padded.grade(0, "  ANSWER 0 ").unwrap();
        let b = plain.grade(0, "answer 0").unwrap();

        assert_eq!(a, b);
        assert!(a.correct);
        assert_eq!(a.correct_answer, "Answer 0");
        assert_eq!(padded.score(), plain.score());
    }

    #[test]
    fn regrading_an_index_never_changes_score() {
        let mut state = state_with(3, &mut RandomSource::seeded(3));

        let first = state.grade(1, "wrong 1").unwrap();
        assert!(!first.correct);
        assert_eq!(state.score(), 0);

        let second = state.grade(1, "Answer 1").unwrap();
        assert!(second.correct);
        assert_eq!(state.score(), 0);

        state.grade(2, "Answer 2").unwrap();
        state.grade(2, "Answer 2").unwrap();
        assert_eq!(state.score(), 1);
        assert_eq!(state.answered_indices().len(), 2);
    }

    #[test]
    fn out_of_range_index_is_rejected_without_side_effects() {
        let mut state = state_with(2, &mut RandomSource::seeded(4));
        let err = state.grade(2, "Answer 2").unwrap_err();
        assert_eq!(err, SessionError::InvalidIndex { index: 2, len: 2 });
        assert!(state.answered_indices().is_empty());
    }

    #[test]
    fn restart_keeps_questions() {
        let mut state = state_with(2, &mut RandomSource::seeded(5));
        state.grade(0, "Answer 0").unwrap();
        state.grade(1, "Answer 1").unwrap();
        assert!(state.is_finished());

        let questions = state.questions().clone();
        state.restart();
        assert_eq!(state.score(), 0);
        assert!(!state.is_finished());
        assert_eq!(state.questions(), &questions);
    }

    #[test]
    fn progress_and_summary() {
        let mut state = state_with(4, &mut RandomSource::seeded(6));
        state.grade(0, "Answer 0").unwrap();
        state.grade(1, "wrong 1").unwrap();

        let progress = state.progress();
        assert_eq!(progress.total, 4);
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.score, 1);

        let summary = state.summary();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.errors, 3);
    }

    #[test]
    fn from_text_builds_a_session() {
        let state = SessionState::from_text(
            "Capital of France?\n+ Paris\n* London\n",
            &mut RandomSource::seeded(7),
        )
        .unwrap();
        assert_eq!(state.questions().len(), 1);

        let err = SessionState::from_text("   ", &mut RandomSource::seeded(7)).unwrap_err();
        assert!(matches!(err, Error::Format(parser::FormatError::EmptyInput)));
    }

    #[test]
    fn snapshot_round_trips_and_rejects_tampering() {
        let mut state = state_with(3, &mut RandomSource::seeded(8));
        state.grade(2, "Answer 2").unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);

        let tampered = json.replace("\"answered\":[2]", "\"answered\":[9]");
        assert!(serde_json::from_str::<SessionState>(&tampered).is_err());

        let inflated = json.replace("\"score\":1", "\"score\":3");
        assert!(serde_json::from_str::<SessionState>(&inflated).is_err());
    }
}
