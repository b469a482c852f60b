pub mod aggregate;
pub mod movement;
pub mod outcome;
pub mod points;
pub mod ranking;
pub mod validation;

pub use aggregate::{aggregate, resolve_pairings, PairingResult, SetScore, TeamMatchStat, TierTally};
pub use movement::{plan_movement, MovementAssignment, MovementContext, MovementPlan};
pub use outcome::{evaluate_set, SetOutcome, Side, Undecided};
pub use points::{league_points, tier_offset, WeeklyPoints};
pub use ranking::{compare_stats, rank_tier, DecidedBy, TierRanking};
pub use validation::validate_submission;
