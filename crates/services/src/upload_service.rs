use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::model::{Question, QuizId, QuizSet};
use quiz_core::{Clock, RandomSource, SessionState, parser};
use storage::repository::{NewQuizRecord, QuizRepository};

use crate::error::UploadError;

const UNTITLED: &str = "Untitled quiz";

/// A quiz file as received from the user.
#[derive(Debug, Clone)]
pub struct QuizUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub uploaded_by: Option<String>,
}

impl QuizUpload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            uploaded_by: None,
        }
    }

    #[must_use]
    pub fn with_uploaded_by(mut self, user: Option<String>) -> Self {
        self.uploaded_by = user;
        self
    }
}

/// Result of a successful upload: the stored quiz and a fresh session over it.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub quiz_id: QuizId,
    pub parsed_questions: usize,
    pub session: SessionState,
}

/// Turns uploaded files into stored quizzes and ready-to-play sessions.
#[derive(Clone)]
pub struct UploadService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    random: Arc<Mutex<RandomSource>>,
}

impl UploadService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self {
            clock,
            quizzes,
            random: Arc::new(Mutex::new(RandomSource::thread())),
        }
    }

    #[must_use]
    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = Arc::new(Mutex::new(random));
        self
    }

    /// Draw the questions for one attempt, capped at `MAX_QUIZ_QUESTIONS`.
    #[must_use]
    pub fn sample(&self, questions: Vec<Question>) -> QuizSet {
        let mut random = self.random.lock().unwrap_or_else(PoisonError::into_inner);
        QuizSet::sample(questions, &mut random)
    }

    /// Decode, parse and persist an uploaded quiz, then seed a session from it.
    ///
    /// Every parsed question is persisted; the session gets a random subset when
    /// the file holds more than the per-attempt cap. Nothing is stored when the
    /// file is rejected.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Decode` for non UTF-8 bytes, `UploadError::Format` for
    /// malformed quiz text, and `UploadError::Storage` if persistence fails.
    pub async fn upload(&self, upload: QuizUpload) -> Result<UploadOutcome, UploadError> {
        let text = std::str::from_utf8(&upload.bytes).map_err(|e| {
            log::warn!("rejected upload {:?}: not UTF-8 ({e})", upload.file_name);
            UploadError::Decode(e)
        })?;

        let questions = parser::parse(text).inspect_err(|e| {
            log::warn!("rejected upload {:?}: {e}", upload.file_name);
        })?;
        let parsed_questions = questions.len();

        let set = self.sample(questions.clone());
        if set.len() < parsed_questions {
            log::debug!(
                "sampled {} of {parsed_questions} questions for the session",
                set.len()
            );
        }
        let session = SessionState::start(set)?;

        let title = if upload.file_name.trim().is_empty() {
            UNTITLED.to_owned()
        } else {
            upload.file_name
        };
        let record = NewQuizRecord::new(title, upload.uploaded_by, self.clock.now(), questions);
        let quiz_id = self.quizzes.insert_quiz(record).await?;

        log::info!("stored quiz {quiz_id} with {parsed_questions} questions");
        Ok(UploadOutcome {
            quiz_id,
            parsed_questions,
            session,
        })
    }
}
