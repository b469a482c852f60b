pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod output;
pub mod pipeline;
pub mod standings;
pub mod stderr_buffer;
pub mod store;

pub use error::{LadderError, Result};
pub use pipeline::{Ladder, Submission, SubmissionOutcome, TierEvaluation};
