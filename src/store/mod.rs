pub mod file;
pub mod fixture;
pub mod memory;
pub mod types;

pub use file::{default_data_path, load_ladder_data, save_ladder_data, FileStore};
pub use fixture::{import_fixture, load_fixture, Fixture, FixtureSlot, ImportSummary};
pub use memory::MemoryStore;
pub use types::{LadderData, StandingsRow, Team, TierKey, TierSlot, WeeklyResultRow};

use crate::error::Result;
use crate::format::Position;

/// Persistence collaborator for the ladder.
///
/// Writes are idempotent upserts. Slot mutators return `Ok(false)` when the
/// addressed slot does not exist.
pub trait LadderStore: Send + Sync {
    fn roster(&self, league: &str) -> Result<Vec<Team>>;
    fn upsert_team(&self, league: &str, team: Team) -> Result<()>;

    fn tier_slot(&self, key: &TierKey) -> Result<Option<TierSlot>>;
    /// All slots of a week, ascending by tier.
    fn tier_slots(&self, league: &str, week: u32) -> Result<Vec<TierSlot>>;
    fn upsert_tier_slot(&self, slot: TierSlot) -> Result<()>;
    fn assign_position(&self, key: &TierKey, position: Position, team_name: &str) -> Result<bool>;
    fn clear_position(&self, key: &TierKey, position: Position) -> Result<bool>;
    fn set_rank_override(&self, key: &TierKey, position: Position, rank: Option<u32>) -> Result<bool>;
    fn set_completed(&self, key: &TierKey, completed: bool) -> Result<bool>;

    fn weekly_results(&self, key: &TierKey) -> Result<Vec<WeeklyResultRow>>;
    fn league_results(&self, league: &str) -> Result<Vec<WeeklyResultRow>>;
    fn upsert_weekly_result(&self, row: WeeklyResultRow) -> Result<()>;
    fn delete_weekly_result(&self, key: &TierKey, team_name: &str) -> Result<()>;

    /// Standings ordered by current position.
    fn standings(&self, league: &str) -> Result<Vec<StandingsRow>>;
    fn standing(&self, league: &str, team_id: &str) -> Result<Option<StandingsRow>>;
    fn upsert_standing(&self, row: StandingsRow) -> Result<()>;
    fn recompute_current_positions(&self, league: &str) -> Result<()>;

    /// Roster entry whose name matches `name`, ignoring case.
    fn find_team(&self, league: &str, name: &str) -> Result<Option<Team>> {
        let name = name.trim();
        Ok(self
            .roster(league)?
            .into_iter()
            .find(|t| t.name.trim().eq_ignore_ascii_case(name)))
    }
}
