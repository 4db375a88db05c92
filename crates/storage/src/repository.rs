use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{ChoiceId, Question, QuestionId, QuizId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A parsed quiz file ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewQuizRecord {
    pub title: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl NewQuizRecord {
    /// Blank uploader labels are stored as `None`; the title is trimmed.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        uploaded_by: Option<String>,
        uploaded_at: DateTime<Utc>,
        questions: Vec<Question>,
    ) -> Self {
        let title = title.into().trim().to_owned();
        let uploaded_by = uploaded_by
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        Self {
            title,
            uploaded_by,
            uploaded_at,
            questions,
        }
    }
}

/// A persisted question. `choice_ids` line up with `question.choices()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuestion {
    pub id: QuestionId,
    /// 1-based position in the uploaded file.
    pub position: u32,
    pub question: Question,
    pub choice_ids: Vec<ChoiceId>,
}

/// A persisted quiz with its questions in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuiz {
    pub id: QuizId,
    pub title: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub questions: Vec<StoredQuestion>,
}

impl StoredQuiz {
    /// Copies the questions out, detached from their storage ids.
    #[must_use]
    pub fn to_questions(&self) -> Vec<Question> {
        self.questions.iter().map(|q| q.question.clone()).collect()
    }
}

/// Row shape for quiz listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizListItem {
    pub id: QuizId,
    pub title: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub question_count: u32,
}

/// Repository contract for uploaded quizzes.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a quiz with all of its questions and choices, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any part of the quiz cannot be stored; nothing is kept then.
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or if stored rows are invalid.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<StoredQuiz>, StorageError>;

    /// List quizzes, most recent upload first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizListItem>, StorageError>;
}

#[derive(Default)]
struct InMemoryState {
    next_quiz_id: u64,
    next_question_id: u64,
    next_choice_id: u64,
    quizzes: BTreeMap<QuizId, StoredQuiz>,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(index: usize) -> Result<u32, StorageError> {
    u32::try_from(index + 1).map_err(|_| StorageError::Serialization("position overflow".into()))
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let state = &mut *guard;

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for (index, question) in quiz.questions.into_iter().enumerate() {
            let choice_ids = question
                .choices()
                .iter()
                .map(|_| ChoiceId::new(next_id(&mut state.next_choice_id)))
                .collect();
            questions.push(StoredQuestion {
                id: QuestionId::new(next_id(&mut state.next_question_id)),
                position: position(index)?,
                question,
                choice_ids,
            });
        }

        let id = QuizId::new(next_id(&mut state.next_quiz_id));
        state.quizzes.insert(
            id,
            StoredQuiz {
                id,
                title: quiz.title,
                uploaded_by: quiz.uploaded_by,
                uploaded_at: quiz.uploaded_at,
                questions,
            },
        );
        Ok(id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<StoredQuiz>, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizListItem>, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quizzes: Vec<&StoredQuiz> = guard.quizzes.values().collect();
        quizzes.sort_by(|a, b| (b.uploaded_at, b.id).cmp(&(a.uploaded_at, a.id)));

        quizzes
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|quiz| {
                Ok(QuizListItem {
                    id: quiz.id,
                    title: quiz.title.clone(),
                    uploaded_by: quiz.uploaded_by.clone(),
                    uploaded_at: quiz.uploaded_at,
                    question_count: u32::try_from(quiz.questions.len()).map_err(|_| {
                        StorageError::Serialization("question count overflow".into())
                    })?,
                })
            })
            .collect()
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let quizzes: Arc<dyn QuizRepository> = Arc::new(InMemoryRepository::new());
        Self { quizzes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::Choice;
    use quiz_core::time::fixed_now;

    fn build_question(text: &str) -> Question {
        Question::new(
            text,
            vec![
                Choice::incorrect("no").unwrap(),
                Choice::correct("yes").unwrap(),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn round_trips_quiz_in_source_order() {
        let repo = InMemoryRepository::new();
        let record = NewQuizRecord::new(
            " capitals.txt ",
            Some("  ".into()),
            fixed_now(),
            vec![build_question("A"), build_question("B")],
        );

        let id = repo.insert_quiz(record).await.unwrap();
        let quiz = repo.get_quiz(id).await.unwrap().expect("stored");

        assert_eq!(quiz.title, "capitals.txt");
        assert_eq!(quiz.uploaded_by, None);
        let positions: Vec<_> = quiz.questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, [1, 2]);
        assert_eq!(quiz.questions[1].choice_ids.len(), 2);
        assert_eq!(
            quiz.to_questions(),
            vec![build_question("A"), build_question("B")]
        );
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let repo = InMemoryRepository::new();
        let older = NewQuizRecord::new("old", None, fixed_now(), vec![build_question("A")]);
        let newer = NewQuizRecord::new(
            "new",
            Some("ana".into()),
            fixed_now() + Duration::minutes(5),
            vec![build_question("A"), build_question("B")],
        );
        repo.insert_quiz(older).await.unwrap();
        repo.insert_quiz(newer).await.unwrap();

        let listed = repo.list_quizzes(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "new");
        assert_eq!(listed[0].question_count, 2);
        assert_eq!(listed[1].title, "old");

        assert_eq!(repo.list_quizzes(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_quiz_is_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_quiz(QuizId::new(99)).await.unwrap().is_none());
    }
}
