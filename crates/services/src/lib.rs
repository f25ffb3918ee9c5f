#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use vocab_core::Clock;

pub use error::SessionError;
pub use quiz::{AnswerFeedback, CurrentQuestion, NextQuestion, QuizService, QuizSession};
