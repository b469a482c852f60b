use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::format::{FormatId, Position};

pub const DATA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

/// Address of one tier in one week.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TierKey {
    pub league: String,
    pub week: u32,
    pub tier: u32,
}

impl TierKey {
    pub fn new(league: impl Into<String>, week: u32, tier: u32) -> Self {
        Self {
            league: league.into(),
            week,
            tier,
        }
    }
}

impl std::fmt::Display for TierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} week {} tier {}", self.league, self.week, self.tier)
    }
}

/// One scheduled tier. Positions without a team are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSlot {
    pub league: String,
    pub week: u32,
    pub tier: u32,
    pub format: FormatId,
    #[serde(default)]
    pub teams: BTreeMap<Position, String>,
    /// Manual rank overrides, consulted by the weekly rank tracker.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ranks: BTreeMap<Position, u32>,
    #[serde(default)]
    pub completed: bool,
}

impl TierSlot {
    pub fn new(league: impl Into<String>, week: u32, tier: u32, format: FormatId) -> Self {
        Self {
            league: league.into(),
            week,
            tier,
            format,
            teams: BTreeMap::new(),
            ranks: BTreeMap::new(),
            completed: false,
        }
    }

    pub fn key(&self) -> TierKey {
        TierKey::new(self.league.clone(), self.week, self.tier)
    }

    pub fn team_at(&self, position: Position) -> Option<&str> {
        self.teams
            .get(&position)
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    /// Every position of the slot's format has a team.
    pub fn is_filled(&self) -> bool {
        self.format
            .spec()
            .labels
            .iter()
            .all(|&p| self.team_at(p).is_some())
    }
}

/// A team's scored result for one tier submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyResultRow {
    pub league: String,
    pub week: u32,
    pub tier: u32,
    pub team_name: String,
    pub rank: u32,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
    pub differential: i64,
    /// Raw set scores and spares, kept for audit only.
    #[serde(default)]
    pub audit: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

impl WeeklyResultRow {
    pub fn key(&self) -> TierKey {
        TierKey::new(self.league.clone(), self.week, self.tier)
    }
}

/// Season totals for one team. Displayed values are automatic + manual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub league: String,
    pub team_id: String,
    pub team_name: String,
    pub wins: i64,
    pub losses: i64,
    pub points: i64,
    pub differential: i64,
    #[serde(default)]
    pub manual_wins_adj: i64,
    #[serde(default)]
    pub manual_losses_adj: i64,
    #[serde(default)]
    pub manual_points_adj: i64,
    #[serde(default)]
    pub manual_diff_adj: i64,
    #[serde(default)]
    pub current_position: Option<u32>,
}

impl StandingsRow {
    pub fn new(league: impl Into<String>, team: &Team) -> Self {
        Self {
            league: league.into(),
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            ..Self::default()
        }
    }

    pub fn total_wins(&self) -> i64 {
        self.wins + self.manual_wins_adj
    }

    pub fn total_losses(&self) -> i64 {
        self.losses + self.manual_losses_adj
    }

    pub fn total_points(&self) -> i64 {
        self.points + self.manual_points_adj
    }

    pub fn total_differential(&self) -> i64 {
        self.differential + self.manual_diff_adj
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueData {
    #[serde(default)]
    pub roster: Vec<Team>,
    #[serde(default)]
    pub slots: Vec<TierSlot>,
    #[serde(default)]
    pub results: Vec<WeeklyResultRow>,
    #[serde(default)]
    pub standings: Vec<StandingsRow>,
}

/// The whole persisted document, keyed by league id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderData {
    pub version: u32,
    #[serde(default)]
    pub leagues: BTreeMap<String, LeagueData>,
}

impl Default for LadderData {
    fn default() -> Self {
        Self::new()
    }
}

impl LadderData {
    pub fn new() -> Self {
        Self {
            version: DATA_VERSION,
            leagues: BTreeMap::new(),
        }
    }

    fn league(&self, league: &str) -> Option<&LeagueData> {
        self.leagues.get(league)
    }

    fn league_mut(&mut self, league: &str) -> &mut LeagueData {
        self.leagues.entry(league.to_string()).or_default()
    }

    pub fn roster(&self, league: &str) -> Vec<Team> {
        self.league(league)
            .map(|l| l.roster.clone())
            .unwrap_or_default()
    }

    /// Insert a team, or rename it if the id already exists.
    pub fn upsert_team(&mut self, league: &str, team: Team) {
        let roster = &mut self.league_mut(league).roster;
        match roster.iter_mut().find(|t| t.id == team.id) {
            Some(existing) => existing.name = team.name,
            None => roster.push(team),
        }
    }

    pub fn tier_slot(&self, key: &TierKey) -> Option<TierSlot> {
        self.league(&key.league)
            .and_then(|l| {
                l.slots
                    .iter()
                    .find(|s| s.week == key.week && s.tier == key.tier)
            })
            .cloned()
    }

    /// All slots of a week, ascending by tier.
    pub fn tier_slots(&self, league: &str, week: u32) -> Vec<TierSlot> {
        let mut slots: Vec<TierSlot> = self
            .league(league)
            .map(|l| l.slots.iter().filter(|s| s.week == week).cloned().collect())
            .unwrap_or_default();
        slots.sort_by_key(|s| s.tier);
        slots
    }

    pub fn upsert_tier_slot(&mut self, slot: TierSlot) {
        let slots = &mut self.league_mut(&slot.league).slots;
        match slots
            .iter_mut()
            .find(|s| s.week == slot.week && s.tier == slot.tier)
        {
            Some(existing) => *existing = slot,
            None => slots.push(slot),
        }
    }

    fn slot_mut(&mut self, key: &TierKey) -> Option<&mut TierSlot> {
        self.leagues
            .get_mut(&key.league)?
            .slots
            .iter_mut()
            .find(|s| s.week == key.week && s.tier == key.tier)
    }

    /// Returns false when the slot does not exist.
    pub fn assign_position(&mut self, key: &TierKey, position: Position, team_name: &str) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                // A name occupies one label per slot.
                slot.teams.retain(|p, name| *p == position || name.as_str() != team_name);
                slot.teams.insert(position, team_name.to_string());
                true
            }
            None => false,
        }
    }

    /// Empty a label, keeping any rank override on it.
    pub fn clear_position(&mut self, key: &TierKey, position: Position) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                slot.teams.remove(&position);
                true
            }
            None => false,
        }
    }

    pub fn set_rank_override(&mut self, key: &TierKey, position: Position, rank: Option<u32>) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                match rank {
                    Some(rank) => slot.ranks.insert(position, rank),
                    None => slot.ranks.remove(&position),
                };
                true
            }
            None => false,
        }
    }

    pub fn set_completed(&mut self, key: &TierKey, completed: bool) -> bool {
        match self.slot_mut(key) {
            Some(slot) => {
                slot.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn weekly_results(&self, key: &TierKey) -> Vec<WeeklyResultRow> {
        self.league(&key.league)
            .map(|l| {
                l.results
                    .iter()
                    .filter(|r| r.week == key.week && r.tier == key.tier)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn league_results(&self, league: &str) -> Vec<WeeklyResultRow> {
        self.league(league)
            .map(|l| l.results.clone())
            .unwrap_or_default()
    }

    pub fn upsert_weekly_result(&mut self, row: WeeklyResultRow) {
        let results = &mut self.league_mut(&row.league).results;
        match results.iter_mut().find(|r| {
            r.week == row.week && r.tier == row.tier && r.team_name == row.team_name
        }) {
            Some(existing) => *existing = row,
            None => results.push(row),
        }
    }

    pub fn delete_weekly_result(&mut self, key: &TierKey, team_name: &str) {
        if let Some(league) = self.leagues.get_mut(&key.league) {
            league.results.retain(|r| {
                !(r.week == key.week && r.tier == key.tier && r.team_name == team_name)
            });
        }
    }

    pub fn standings(&self, league: &str) -> Vec<StandingsRow> {
        let mut rows = self
            .league(league)
            .map(|l| l.standings.clone())
            .unwrap_or_default();
        rows.sort_by_key(|r| (r.current_position.unwrap_or(u32::MAX), r.team_name.clone()));
        rows
    }

    pub fn standing(&self, league: &str, team_id: &str) -> Option<StandingsRow> {
        self.league(league)?
            .standings
            .iter()
            .find(|r| r.team_id == team_id)
            .cloned()
    }

    pub fn upsert_standing(&mut self, row: StandingsRow) {
        let standings = &mut self.league_mut(&row.league).standings;
        match standings.iter_mut().find(|r| r.team_id == row.team_id) {
            Some(existing) => *existing = row,
            None => standings.push(row),
        }
    }

    /// Order by points, then differential (both including manual
    /// adjustments), then team name, and number from 1.
    pub fn recompute_current_positions(&mut self, league: &str) {
        let Some(league) = self.leagues.get_mut(league) else {
            return;
        };
        league.standings.sort_by(|a, b| {
            b.total_points()
                .cmp(&a.total_points())
                .then(b.total_differential().cmp(&a.total_differential()))
                .then(a.team_name.cmp(&b.team_name))
        });
        for (i, row) in league.standings.iter_mut().enumerate() {
            row.current_position = Some(i as u32 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_slot_upsert_and_assign() {
        let mut data = LadderData::new();
        data.upsert_tier_slot(TierSlot::new("spring", 2, 1, FormatId::TwoTeamsElite));
        let key = TierKey::new("spring", 2, 1);

        assert!(data.assign_position(&key, Position::A, "Spikers"));
        assert!(data.assign_position(&key, Position::B, "Diggers"));
        // Re-running the same assignment is a no-op
        assert!(data.assign_position(&key, Position::A, "Spikers"));

        let slot = data.tier_slot(&key).unwrap();
        assert_eq!(slot.team_at(Position::A), Some("Spikers"));
        assert!(slot.is_filled());

        assert!(!data.assign_position(&TierKey::new("spring", 9, 1), Position::A, "Spikers"));
    }

    #[test]
    fn test_assign_moves_name_within_slot() {
        let mut data = LadderData::new();
        data.upsert_tier_slot(TierSlot::new("spring", 2, 1, FormatId::ThreeTeamsSixSets));
        let key = TierKey::new("spring", 2, 1);
        data.assign_position(&key, Position::A, "Spikers");
        data.assign_position(&key, Position::C, "Spikers");
        let slot = data.tier_slot(&key).unwrap();
        assert_eq!(slot.team_at(Position::A), None);
        assert_eq!(slot.team_at(Position::C), Some("Spikers"));
    }

    #[test]
    fn test_clear_position_keeps_override() {
        let mut data = LadderData::new();
        data.upsert_tier_slot(TierSlot::new("spring", 2, 1, FormatId::TwoTeamsElite));
        let key = TierKey::new("spring", 2, 1);
        data.assign_position(&key, Position::B, "Spikers");
        data.set_rank_override(&key, Position::B, Some(3));

        assert!(data.clear_position(&key, Position::B));
        let slot = data.tier_slot(&key).unwrap();
        assert_eq!(slot.team_at(Position::B), None);
        assert_eq!(slot.ranks.get(&Position::B), Some(&3));
        assert!(!data.clear_position(&TierKey::new("spring", 9, 1), Position::A));
    }

    #[test]
    fn test_tier_slots_sorted_by_tier() {
        let mut data = LadderData::new();
        data.upsert_tier_slot(TierSlot::new("spring", 1, 3, FormatId::TwoTeamsElite));
        data.upsert_tier_slot(TierSlot::new("spring", 1, 1, FormatId::TwoTeamsElite));
        data.upsert_tier_slot(TierSlot::new("spring", 2, 2, FormatId::TwoTeamsElite));
        let tiers: Vec<u32> = data.tier_slots("spring", 1).iter().map(|s| s.tier).collect();
        assert_eq!(tiers, vec![1, 3]);
    }

    #[test]
    fn test_recompute_positions_orders_by_points_then_diff_then_name() {
        let mut data = LadderData::new();
        for (id, name, points, diff) in [
            ("t1", "Zebras", 10, 5),
            ("t2", "Aces", 10, 5),
            ("t3", "Blockers", 10, 9),
            ("t4", "Diggers", 12, -20),
        ] {
            let mut row = StandingsRow::new("spring", &team(id, name));
            row.points = points;
            row.differential = diff;
            data.upsert_standing(row);
        }
        data.recompute_current_positions("spring");
        let names: Vec<String> = data
            .standings("spring")
            .into_iter()
            .map(|r| r.team_name)
            .collect();
        assert_eq!(names, vec!["Diggers", "Blockers", "Aces", "Zebras"]);
    }

    #[test]
    fn test_manual_adjustment_counts_toward_position() {
        let mut data = LadderData::new();
        let mut leader = StandingsRow::new("spring", &team("t1", "Aces"));
        leader.points = 10;
        let mut chaser = StandingsRow::new("spring", &team("t2", "Blockers"));
        chaser.points = 8;
        chaser.manual_points_adj = 3;
        data.upsert_standing(leader);
        data.upsert_standing(chaser);
        data.recompute_current_positions("spring");
        assert_eq!(data.standing("spring", "t2").unwrap().current_position, Some(1));
    }

    #[test]
    fn test_weekly_result_upsert_is_keyed_by_team() {
        let mut data = LadderData::new();
        let row = WeeklyResultRow {
            league: "spring".to_string(),
            week: 1,
            tier: 1,
            team_name: "Aces".to_string(),
            rank: 1,
            league_points: 5,
            wins: 3,
            losses: 0,
            differential: 12,
            audit: serde_json::Value::Null,
            submitted_at: Utc::now(),
        };
        data.upsert_weekly_result(row.clone());
        data.upsert_weekly_result(WeeklyResultRow { rank: 2, ..row });
        let rows = data.weekly_results(&TierKey::new("spring", 1, 1));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 2);

        data.delete_weekly_result(&TierKey::new("spring", 1, 1), "Aces");
        assert!(data.weekly_results(&TierKey::new("spring", 1, 1)).is_empty());
    }

    #[test]
    fn test_upsert_team_renames() {
        let mut data = LadderData::new();
        data.upsert_team("spring", team("t1", "Aces"));
        data.upsert_team("spring", team("t1", "Aces Wild"));
        let roster = data.roster("spring");
        assert_eq!(roster, vec![team("t1", "Aces Wild")]);
    }
}
