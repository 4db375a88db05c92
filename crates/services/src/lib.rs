#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod upload_service;

pub use quiz_core::{Clock, RandomSource};

pub use app_services::{QuizServices, StartedQuiz};
pub use error::{QuizLoopError, QuizServicesError, StoreError, UploadError};
pub use sessions::{AnswerFeedback, QuestionView, QuizLoopService, SessionKey, SessionStore};
pub use upload_service::{QuizUpload, UploadOutcome, UploadService};
