#![forbid(unsafe_code)]

pub mod achievements;
pub mod answer;
pub mod error;
pub mod history;
pub mod model;
pub mod scheduler;
pub mod time;

pub use error::Error;
pub use history::ReviewHistoryStore;
pub use scheduler::{Scheduler, SchedulerError};
pub use time::Clock;
