use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::session::{QuizSummary, SessionProgress};
use quiz_core::{RandomSource, SessionError, SessionPhase, SessionState};

use super::store::{SessionKey, SessionStore};
use super::view::{AnswerFeedback, QuestionView};
use crate::error::{QuizLoopError, StoreError};

/// Drives stored quiz sessions: start, next question, answer, restart.
#[derive(Clone)]
pub struct QuizLoopService {
    store: SessionStore,
    random: Arc<Mutex<RandomSource>>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            random: Arc::new(Mutex::new(RandomSource::thread())),
        }
    }

    #[must_use]
    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = Arc::new(Mutex::new(random));
        self
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn pick_next(&self, state: &SessionState) -> Option<QuestionView> {
        let mut random = self.random.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .next_question(&mut random)
            .map(|next| QuestionView::new(state, next))
    }

    /// Stale, tampered or missing state all end the same way: the user starts over.
    fn expire(&self, key: &SessionKey, err: StoreError) -> Result<QuizLoopError, QuizLoopError> {
        match err {
            StoreError::Snapshot(e) => {
                log::warn!("discarding unreadable session {key}: {e}");
                self.store.remove(key)?;
                Ok(QuizLoopError::SessionExpired)
            }
            other => Err(other.into()),
        }
    }

    fn load(&self, key: &SessionKey) -> Result<SessionState, QuizLoopError> {
        match self.store.get(key) {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Err(QuizLoopError::SessionExpired),
            Err(err) => Err(self.expire(key, err)?),
        }
    }

    /// Store a fresh session for `key`, replacing any previous attempt, and pick
    /// its first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Store` if the session cannot be stored.
    pub fn begin(
        &self,
        key: &SessionKey,
        state: SessionState,
    ) -> Result<Option<QuestionView>, QuizLoopError> {
        self.store.put(key, &state)?;
        log::info!(
            "session {key} started with {} questions",
            state.questions().len()
        );
        Ok(self.pick_next(&state))
    }

    /// Reset answers and score of the stored session and pick a first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::SessionExpired` if there is no usable session.
    pub fn restart(&self, key: &SessionKey) -> Result<Option<QuestionView>, QuizLoopError> {
        let restarted = match self.store.update(key, |state| {
            state.restart();
            Ok::<_, SessionError>(state.clone())
        }) {
            Ok(Some(Ok(state))) => state,
            Ok(Some(Err(_)) | None) => return Err(QuizLoopError::SessionExpired),
            Err(err) => return Err(self.expire(key, err)?),
        };
        log::info!("session {key} restarted");
        Ok(self.pick_next(&restarted))
    }

    /// `Idle` when `key` has no usable session.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Store` if the store is unavailable.
    pub fn phase(&self, key: &SessionKey) -> Result<SessionPhase, QuizLoopError> {
        match self.load(key) {
            Ok(state) => Ok(state.phase()),
            Err(QuizLoopError::SessionExpired) => Ok(SessionPhase::Idle),
            Err(err) => Err(err),
        }
    }

    /// Pick a random unanswered question, or `None` when the quiz is over.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::SessionExpired` if there is no usable session.
    pub fn next_question(&self, key: &SessionKey) -> Result<Option<QuestionView>, QuizLoopError> {
        let state = self.load(key)?;
        Ok(self.pick_next(&state))
    }

    /// # Errors
    ///
    /// Returns `QuizLoopError::SessionExpired` if there is no usable session.
    pub fn progress(&self, key: &SessionKey) -> Result<SessionProgress, QuizLoopError> {
        Ok(self.load(key)?.progress())
    }

    /// Final score of the stored attempt, errors counted against the per-attempt total.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::SessionExpired` if there is no usable session.
    pub fn summary(&self, key: &SessionKey) -> Result<QuizSummary, QuizLoopError> {
        Ok(self.load(key)?.summary())
    }

    /// Grade an answer and return feedback plus the next question.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::SessionExpired` when the session is missing or the
    /// index does not belong to it.
    pub fn submit_answer(
        &self,
        key: &SessionKey,
        index: usize,
        answer: &str,
    ) -> Result<AnswerFeedback, QuizLoopError> {
        let graded = self.store.update(key, |state| {
            let result = state.grade(index, answer)?;
            Ok::<_, SessionError>((result, state.clone()))
        });

        let (result, state) = match graded {
            Ok(Some(Ok(graded))) => graded,
            Ok(Some(Err(err))) => {
                log::warn!("session {key} rejected answer for index {index}: {err}");
                return Err(QuizLoopError::SessionExpired);
            }
            Ok(None) => return Err(QuizLoopError::SessionExpired),
            Err(err) => return Err(self.expire(key, err)?),
        };

        log::debug!(
            "session {key} index {index}: correct={} score={}",
            result.correct,
            state.score()
        );
        let next = if result.is_finished {
            log::info!(
                "session {key} finished with {}/{}",
                state.score(),
                state.target()
            );
            None
        } else {
            self.pick_next(&state)
        };
        Ok(AnswerFeedback::new(result, &state, next))
    }

    /// Discard the session for `key`.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Store` if the store is unavailable.
    pub fn end(&self, key: &SessionKey) -> Result<(), QuizLoopError> {
        self.store.remove(key)?;
        Ok(())
    }
}
