#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod parser;
pub mod random;
pub mod session;
pub mod time;

pub use error::Error;
pub use random::RandomSource;
pub use session::{GradeResult, NextQuestion, SessionError, SessionPhase, SessionState};
pub use time::Clock;
