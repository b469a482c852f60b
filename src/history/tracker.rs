use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::seed::seed_order;
use crate::error::Result;
use crate::store::{LadderStore, TierSlot, WeeklyResultRow};

/// Where a week's rank came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RankSource {
    /// Week 1, from the schedule.
    Seed,
    /// The week's own tier placement.
    Placement,
    /// The previous week's results, before placement was written.
    Results,
    /// A manual override on the team's slot position.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyRank {
    pub team_name: String,
    pub week: u32,
    pub rank: u32,
    pub source: RankSource,
}

/// Rank per team for weeks `1..=through_week`; `None` where a week has no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankHistory {
    pub through_week: u32,
    pub teams: BTreeMap<String, Vec<Option<u32>>>,
}

impl RankHistory {
    /// Teams ordered by the latest week's rank, earlier weeks breaking ties.
    /// Teams without a rank in a week sort after those with one.
    pub fn ordered(&self) -> Vec<(&str, &[Option<u32>])> {
        let mut rows: Vec<(&str, &[Option<u32>])> = self
            .teams
            .iter()
            .map(|(name, ranks)| (name.as_str(), ranks.as_slice()))
            .collect();
        rows.sort_by_key(|(name, ranks)| {
            let by_week: Vec<u32> = ranks.iter().rev().map(|r| r.unwrap_or(u32::MAX)).collect();
            (by_week, name.to_string())
        });
        rows
    }
}

fn elite_slots(slots: Vec<TierSlot>) -> Vec<TierSlot> {
    slots
        .into_iter()
        .filter(|s| s.format.spec().elite)
        .collect()
}

/// Ascending tier, then label order within the tier.
fn placement_order(slots: &[TierSlot]) -> Vec<String> {
    slots
        .iter()
        .flat_map(|slot| {
            slot.format
                .spec()
                .labels
                .iter()
                .filter_map(|&label| slot.team_at(label).map(str::to_string))
        })
        .collect()
}

/// Ascending tier, then within-tier rank.
fn results_order(rows: &[WeeklyResultRow], elite_tiers: &[u32]) -> Vec<String> {
    let mut rows: Vec<&WeeklyResultRow> = rows
        .iter()
        .filter(|r| elite_tiers.contains(&r.tier))
        .collect();
    rows.sort_by(|a, b| a.tier.cmp(&b.tier).then(a.rank.cmp(&b.rank)));
    rows.into_iter().map(|r| r.team_name.clone()).collect()
}

/// Elite ranks for one week.
///
/// Week 1 uses the seed order. Later weeks use the week's placement when
/// every elite position is filled, and otherwise the previous week's results.
/// Overrides recorded on the week's slots win over either.
pub fn week_ranks<S: LadderStore + ?Sized>(store: &S, league: &str, week: u32) -> Result<Vec<WeeklyRank>> {
    let slots = elite_slots(store.tier_slots(league, week)?);

    let (order, source) = if week <= 1 {
        (seed_order(&slots), RankSource::Seed)
    } else if !slots.is_empty() && slots.iter().all(TierSlot::is_filled) {
        (placement_order(&slots), RankSource::Placement)
    } else {
        let previous = elite_slots(store.tier_slots(league, week - 1)?);
        let tiers: Vec<u32> = previous.iter().map(|s| s.tier).collect();
        let rows: Vec<WeeklyResultRow> = store
            .league_results(league)?
            .into_iter()
            .filter(|r| r.week == week - 1)
            .collect();
        (results_order(&rows, &tiers), RankSource::Results)
    };

    let overrides: HashMap<String, u32> = slots
        .iter()
        .flat_map(|slot| {
            slot.ranks.iter().filter_map(move |(label, rank)| {
                slot.team_at(*label).map(|name| (name.to_lowercase(), *rank))
            })
        })
        .collect();

    let mut ranks: Vec<WeeklyRank> = order
        .into_iter()
        .enumerate()
        .map(|(i, team_name)| match overrides.get(&team_name.to_lowercase()) {
            Some(&rank) => WeeklyRank {
                team_name,
                week,
                rank,
                source: RankSource::Override,
            },
            None => WeeklyRank {
                team_name,
                week,
                rank: i as u32 + 1,
                source,
            },
        })
        .collect();
    ranks.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.team_name.cmp(&b.team_name)));
    Ok(ranks)
}

/// Rank history for every team seen in weeks `1..=through_week`.
pub fn rank_history<S: LadderStore + ?Sized>(
    store: &S,
    league: &str,
    through_week: u32,
) -> Result<RankHistory> {
    let mut history = RankHistory {
        through_week,
        teams: BTreeMap::new(),
    };
    let weeks = through_week as usize;

    for week in 1..=through_week {
        for entry in week_ranks(store, league, week)? {
            let ranks = history
                .teams
                .entry(entry.team_name)
                .or_insert_with(|| vec![None; weeks]);
            ranks[week as usize - 1] = Some(entry.rank);
        }
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatId, Position};
    use crate::store::{MemoryStore, TierKey};
    use chrono::Utc;

    fn slot(week: u32, tier: u32, format: FormatId, names: &[&str]) -> TierSlot {
        let mut slot = TierSlot::new("spring", week, tier, format);
        for (label, name) in Position::ALL.iter().zip(names) {
            slot.teams.insert(*label, name.to_string());
        }
        slot
    }

    fn result(week: u32, tier: u32, team: &str, rank: u32) -> WeeklyResultRow {
        WeeklyResultRow {
            league: "spring".to_string(),
            week,
            tier,
            team_name: team.to_string(),
            rank,
            league_points: 0,
            wins: 0,
            losses: 0,
            differential: 0,
            audit: serde_json::Value::Null,
            submitted_at: Utc::now(),
        }
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .upsert_tier_slot(slot(1, 1, FormatId::TwoTeamsElite, &["T1", "T2"]))
            .unwrap();
        store
            .upsert_tier_slot(slot(1, 2, FormatId::TwoTeamsElite, &["T3", "T4"]))
            .unwrap();
        store
            .upsert_tier_slot(slot(1, 3, FormatId::ThreeTeamsSixSets, &["R1", "R2", "R3"]))
            .unwrap();
        store
    }

    fn names(ranks: &[WeeklyRank]) -> Vec<&str> {
        ranks.iter().map(|r| r.team_name.as_str()).collect()
    }

    #[test]
    fn test_week_one_uses_seed_and_ignores_non_elite() {
        let ranks = week_ranks(&store(), "spring", 1).unwrap();
        assert_eq!(names(&ranks), vec!["T1", "T2", "T3", "T4"]);
        assert!(ranks.iter().all(|r| r.source == RankSource::Seed));
        assert_eq!(ranks[3].rank, 4);
    }

    #[test]
    fn test_falls_back_to_previous_results() {
        let store = store();
        store
            .upsert_tier_slot(TierSlot::new("spring", 2, 1, FormatId::TwoTeamsElite))
            .unwrap();
        for row in [
            result(1, 1, "T1", 2),
            result(1, 1, "T2", 1),
            result(1, 2, "T3", 1),
            result(1, 2, "T4", 2),
            result(1, 3, "R1", 1),
        ] {
            store.upsert_weekly_result(row).unwrap();
        }

        let ranks = week_ranks(&store, "spring", 2).unwrap();
        assert_eq!(names(&ranks), vec!["T2", "T1", "T3", "T4"]);
        assert!(ranks.iter().all(|r| r.source == RankSource::Results));
    }

    #[test]
    fn test_placement_wins_once_filled() {
        let store = store();
        store
            .upsert_tier_slot(slot(2, 1, FormatId::TwoTeamsElite, &["T3", "T1"]))
            .unwrap();
        store
            .upsert_tier_slot(slot(2, 2, FormatId::TwoTeamsElite, &["T2", "T4"]))
            .unwrap();
        store.upsert_weekly_result(result(1, 1, "T1", 1)).unwrap();

        let ranks = week_ranks(&store, "spring", 2).unwrap();
        assert_eq!(names(&ranks), vec!["T3", "T1", "T2", "T4"]);
        assert!(ranks.iter().all(|r| r.source == RankSource::Placement));
    }

    #[test]
    fn test_override_replaces_rank() {
        let store = store();
        store
            .set_rank_override(&TierKey::new("spring", 1, 2), Position::B, Some(1))
            .unwrap();
        let ranks = week_ranks(&store, "spring", 1).unwrap();
        let t4 = ranks.iter().find(|r| r.team_name == "T4").unwrap();
        assert_eq!(t4.rank, 1);
        assert_eq!(t4.source, RankSource::Override);
    }

    #[test]
    fn test_rank_history_fills_gaps_with_none() {
        let store = store();
        store
            .upsert_tier_slot(slot(2, 1, FormatId::TwoTeamsElite, &["T2", "T1"]))
            .unwrap();
        store
            .upsert_tier_slot(slot(2, 2, FormatId::TwoTeamsElite, &["T4", "T5"]))
            .unwrap();

        let history = rank_history(&store, "spring", 3).unwrap();
        assert_eq!(history.teams["T1"], vec![Some(1), Some(2), None]);
        assert_eq!(history.teams["T3"], vec![Some(3), None, None]);
        assert_eq!(history.teams["T5"], vec![None, Some(4), None]);

        let ordered = history.ordered();
        assert_eq!(ordered[0].0, "T2");
    }
}
