use thiserror::Error;

use crate::model::{QuestionError, QuizSetError};
use crate::parser::FormatError;
use crate::session::SessionError;

/// Any failure the core can report, for callers that only need to display it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizSet(#[from] QuizSetError),
}
