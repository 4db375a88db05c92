mod store;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{QuizLoopError, StoreError};
pub use store::{SessionKey, SessionStore};
pub use view::{AnswerFeedback, QuestionView};
pub use workflow::QuizLoopService;
