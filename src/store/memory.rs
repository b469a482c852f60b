use std::sync::Mutex;

use super::types::{LadderData, StandingsRow, Team, TierKey, TierSlot, WeeklyResultRow};
use super::LadderStore;
use crate::error::{LadderError, Result};
use crate::format::Position;

/// In-process store, used by tests and by embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<LadderData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: LadderData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> Result<LadderData> {
        self.read(|d| d.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&LadderData) -> T) -> Result<T> {
        let guard = self
            .data
            .lock()
            .map_err(|_| LadderError::Persistence("memory store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut LadderData) -> T) -> Result<T> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| LadderError::Persistence("memory store lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl LadderStore for MemoryStore {
    fn roster(&self, league: &str) -> Result<Vec<Team>> {
        self.read(|d| d.roster(league))
    }

    fn upsert_team(&self, league: &str, team: Team) -> Result<()> {
        self.write(|d| d.upsert_team(league, team))
    }

    fn tier_slot(&self, key: &TierKey) -> Result<Option<TierSlot>> {
        self.read(|d| d.tier_slot(key))
    }

    fn tier_slots(&self, league: &str, week: u32) -> Result<Vec<TierSlot>> {
        self.read(|d| d.tier_slots(league, week))
    }

    fn upsert_tier_slot(&self, slot: TierSlot) -> Result<()> {
        self.write(|d| d.upsert_tier_slot(slot))
    }

    fn assign_position(&self, key: &TierKey, position: Position, team_name: &str) -> Result<bool> {
        self.write(|d| d.assign_position(key, position, team_name))
    }

    fn clear_position(&self, key: &TierKey, position: Position) -> Result<bool> {
        self.write(|d| d.clear_position(key, position))
    }

    fn set_rank_override(&self, key: &TierKey, position: Position, rank: Option<u32>) -> Result<bool> {
        self.write(|d| d.set_rank_override(key, position, rank))
    }

    fn set_completed(&self, key: &TierKey, completed: bool) -> Result<bool> {
        self.write(|d| d.set_completed(key, completed))
    }

    fn weekly_results(&self, key: &TierKey) -> Result<Vec<WeeklyResultRow>> {
        self.read(|d| d.weekly_results(key))
    }

    fn league_results(&self, league: &str) -> Result<Vec<WeeklyResultRow>> {
        self.read(|d| d.league_results(league))
    }

    fn upsert_weekly_result(&self, row: WeeklyResultRow) -> Result<()> {
        self.write(|d| d.upsert_weekly_result(row))
    }

    fn delete_weekly_result(&self, key: &TierKey, team_name: &str) -> Result<()> {
        self.write(|d| d.delete_weekly_result(key, team_name))
    }

    fn standings(&self, league: &str) -> Result<Vec<StandingsRow>> {
        self.read(|d| d.standings(league))
    }

    fn standing(&self, league: &str, team_id: &str) -> Result<Option<StandingsRow>> {
        self.read(|d| d.standing(league, team_id))
    }

    fn upsert_standing(&self, row: StandingsRow) -> Result<()> {
        self.write(|d| d.upsert_standing(row))
    }

    fn recompute_current_positions(&self, league: &str) -> Result<()> {
        self.write(|d| d.recompute_current_positions(league))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatId;

    #[test]
    fn test_find_team_ignores_case() {
        let store = MemoryStore::new();
        store
            .upsert_team(
                "spring",
                Team {
                    id: "t1".to_string(),
                    name: "Net Results".to_string(),
                },
            )
            .unwrap();
        let found = store.find_team("spring", "net results ").unwrap().unwrap();
        assert_eq!(found.id, "t1");
        assert!(store.find_team("spring", "Ghosts").unwrap().is_none());
        assert!(store.find_team("autumn", "Net Results").unwrap().is_none());
    }

    #[test]
    fn test_slot_mutators_report_missing_slot() {
        let store = MemoryStore::new();
        let key = TierKey::new("spring", 1, 1);
        assert!(!store.set_completed(&key, true).unwrap());

        store
            .upsert_tier_slot(TierSlot::new("spring", 1, 1, FormatId::TwoTeamsElite))
            .unwrap();
        assert!(store.set_completed(&key, true).unwrap());
        assert!(store.set_rank_override(&key, Position::A, Some(4)).unwrap());
        let slot = store.tier_slot(&key).unwrap().unwrap();
        assert!(slot.completed);
        assert_eq!(slot.ranks.get(&Position::A), Some(&4));

        store.set_rank_override(&key, Position::A, None).unwrap();
        assert!(store.tier_slot(&key).unwrap().unwrap().ranks.is_empty());
    }
}
