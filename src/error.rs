use thiserror::Error;

/// Errors surfaced by the ladder engine.
#[derive(Error, Debug)]
pub enum LadderError {
    /// Every problem found in a submission, not just the first.
    #[error("invalid submission:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    #[error("no tier {tier} scheduled for league '{league}' week {week}")]
    UnknownTier { league: String, week: u32, tier: u32 },

    #[error("team '{team}' is not on the {league} roster")]
    UnknownTeam { league: String, team: String },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl LadderError {
    /// Whether re-running the same submission can succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LadderError::Persistence(_))
    }
}

pub type Result<T, E = LadderError> = std::result::Result<T, E>;
