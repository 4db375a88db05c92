use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::Question;
use crate::random::RandomSource;

/// Upper bound on the number of questions in one quiz attempt.
pub const MAX_QUIZ_QUESTIONS: usize = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSetError {
    #[error("a quiz holds at most {max} questions, got {len}")]
    TooManyQuestions { len: usize, max: usize },
}

/// The questions used for one quiz attempt, never more than [`MAX_QUIZ_QUESTIONS`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuizSet {
    questions: Vec<Question>,
}

impl QuizSet {
    /// Builds a quiz set from parsed questions.
    ///
    /// When there are more than [`MAX_QUIZ_QUESTIONS`], a uniformly random subset of
    /// exactly that many is kept. Kept questions stay in source order.
    #[must_use]
    pub fn sample(questions: Vec<Question>, random: &mut RandomSource) -> Self {
        if questions.len() <= MAX_QUIZ_QUESTIONS {
            return Self { questions };
        }

        let mut keep = random.sample_indices(questions.len(), MAX_QUIZ_QUESTIONS);
        keep.sort_unstable();
        let mut keep = keep.into_iter().peekable();

        let questions = questions
            .into_iter()
            .enumerate()
            .filter_map(|(index, question)| {
                if keep.peek() == Some(&index) {
                    keep.next();
                    Some(question)
                } else {
                    None
                }
            })
            .collect();

        Self { questions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

impl TryFrom<Vec<Question>> for QuizSet {
    type Error = QuizSetError;

    fn try_from(questions: Vec<Question>) -> Result<Self, Self::Error> {
        if questions.len() > MAX_QUIZ_QUESTIONS {
            return Err(QuizSetError::TooManyQuestions {
                len: questions.len(),
                max: MAX_QUIZ_QUESTIONS,
            });
        }
        Ok(Self { questions })
    }
}

impl From<QuizSet> for Vec<Question> {
    fn from(set: QuizSet) -> Self {
        set.questions
    }
}

impl<'a> IntoIterator for &'a QuizSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}
