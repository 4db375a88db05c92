use std::sync::Arc;

use quiz_core::model::QuizId;
use quiz_core::{RandomSource, SessionState};
use storage::repository::{QuizListItem, QuizRepository, Storage, StorageError};

use crate::Clock;
use crate::error::QuizServicesError;
use crate::sessions::{QuestionView, QuizLoopService, SessionKey, SessionStore};
use crate::upload_service::{QuizUpload, UploadOutcome, UploadService};

/// First question of a freshly started attempt, with the upload it came from.
#[derive(Debug, Clone)]
pub struct StartedQuiz {
    pub quiz_id: QuizId,
    pub parsed_questions: usize,
    pub first: Option<QuestionView>,
}

/// Assembles front-end facing services over one storage backend.
#[derive(Clone)]
pub struct QuizServices {
    quizzes: Arc<dyn QuizRepository>,
    upload: Arc<UploadService>,
    sessions: Arc<QuizLoopService>,
}

impl QuizServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        seed: Option<u64>,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, seed))
    }

    /// Build services over in-memory storage. Nothing outlives the process.
    #[must_use]
    pub fn in_memory(clock: Clock, seed: Option<u64>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, seed)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, seed: Option<u64>) -> Self {
        // Upload sampling and question order draw from separate streams so a seed
        // reproduces both.
        let random = |offset: u64| {
            seed.map_or_else(RandomSource::thread, |s| {
                RandomSource::seeded(s.wrapping_add(offset))
            })
        };
        let upload = UploadService::new(clock, Arc::clone(&storage.quizzes)).with_random(random(0));
        let sessions = QuizLoopService::new(SessionStore::new()).with_random(random(1));

        Self {
            quizzes: Arc::clone(&storage.quizzes),
            upload: Arc::new(upload),
            sessions: Arc::new(sessions),
        }
    }

    #[must_use]
    pub fn upload(&self) -> Arc<UploadService> {
        Arc::clone(&self.upload)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.sessions)
    }

    /// Store an uploaded file and start a new attempt on it for `key`.
    ///
    /// Any previous attempt under `key` is discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError::Upload` if the file is rejected.
    pub async fn upload_and_begin(
        &self,
        key: &SessionKey,
        upload: QuizUpload,
    ) -> Result<StartedQuiz, QuizServicesError> {
        let UploadOutcome {
            quiz_id,
            parsed_questions,
            session,
        } = self.upload.upload(upload).await?;
        let first = self.sessions.begin(key, session)?;
        Ok(StartedQuiz {
            quiz_id,
            parsed_questions,
            first,
        })
    }

    /// Start a new attempt for `key` on a quiz that is already stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if no quiz has `quiz_id`.
    pub async fn replay(
        &self,
        key: &SessionKey,
        quiz_id: QuizId,
    ) -> Result<StartedQuiz, QuizServicesError> {
        let stored = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        let questions = stored.to_questions();
        let parsed_questions = questions.len();

        let set = self.upload.sample(questions);
        let first = self.sessions.begin(key, SessionState::start(set)?)?;
        log::info!("replaying quiz {quiz_id} ({:?}) for {key}", stored.title);
        Ok(StartedQuiz {
            quiz_id,
            parsed_questions,
            first,
        })
    }

    /// Newest uploads first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError::Storage` if the listing query fails.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizListItem>, QuizServicesError> {
        Ok(self.quizzes.list_quizzes(limit).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizServicesError::Loop` if the store is unavailable.
    pub fn end(&self, key: &SessionKey) -> Result<(), QuizServicesError> {
        self.sessions.end(key)?;
        Ok(())
    }
}
