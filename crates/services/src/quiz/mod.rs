mod service;
mod session;

pub use crate::error::SessionError;
pub use service::{AnswerFeedback, NextQuestion, QuizService};
pub use session::{CurrentQuestion, QuizSession};
