use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use crate::error::{LadderError, Result};
use crate::store::{LadderStore, StandingsRow, TierKey, WeeklyResultRow};

/// What one weekly result contributes to a team's season totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contribution {
    pub wins: i64,
    pub losses: i64,
    pub points: i64,
    pub differential: i64,
}

impl Contribution {
    pub fn of(row: &WeeklyResultRow) -> Self {
        Self {
            wins: row.wins as i64,
            losses: row.losses as i64,
            points: row.league_points as i64,
            differential: row.differential,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for Contribution {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            wins: self.wins + rhs.wins,
            losses: self.losses + rhs.losses,
            points: self.points + rhs.points,
            differential: self.differential + rhs.differential,
        }
    }
}

impl Sub for Contribution {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            wins: self.wins - rhs.wins,
            losses: self.losses - rhs.losses,
            points: self.points - rhs.points,
            differential: self.differential - rhs.differential,
        }
    }
}

/// Additive manual correction, independent of submitted results.
pub type Adjustment = Contribution;

fn by_team(rows: &[WeeklyResultRow]) -> BTreeMap<String, Contribution> {
    let mut map: BTreeMap<String, Contribution> = BTreeMap::new();
    for row in rows {
        let entry = map.entry(row.team_name.clone()).or_default();
        *entry = *entry + Contribution::of(row);
    }
    map
}

/// `new - previous` per team, including teams present in only one snapshot.
pub fn snapshot_delta(
    previous: &[WeeklyResultRow],
    new: &[WeeklyResultRow],
) -> BTreeMap<String, Contribution> {
    let previous = by_team(previous);
    let mut delta = by_team(new);
    for (team, old) in previous {
        let entry = delta.entry(team).or_default();
        *entry = *entry - old;
    }
    delta
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandingsUpdate {
    /// Teams whose standings changed, with the delta applied.
    pub applied: Vec<(String, Contribution)>,
    /// Teams dropped from the tier since the previous submission.
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

/// Replace the weekly rows for `key` with `new_rows` and move the season
/// standings by the difference.
///
/// Resubmitting identical content leaves standings untouched. Each team's
/// delta reaches the standings before its weekly row is saved or deleted, so
/// the stored rows never claim more than the standings hold and a failed run
/// can be retried. The caller holds the per-tier lock.
pub fn update_standings<S: LadderStore + ?Sized>(
    store: &S,
    key: &TierKey,
    new_rows: Vec<WeeklyResultRow>,
) -> Result<StandingsUpdate> {
    let previous = store.weekly_results(key)?;
    let delta = snapshot_delta(&previous, &new_rows);
    let mut new_rows: BTreeMap<String, WeeklyResultRow> = new_rows
        .into_iter()
        .map(|row| (row.team_name.clone(), row))
        .collect();
    let mut update = StandingsUpdate::default();

    for (team_name, change) in delta {
        if !change.is_zero() {
            if apply_change(store, &key.league, &team_name, change)? {
                update.applied.push((team_name.clone(), change));
            } else {
                let reason = format!("{}: '{}' is not on the roster, standings not updated", key, team_name);
                crate::buffered_eprintln!("Warning: {}", reason);
                update.skipped.push(reason);
            }
        }

        match new_rows.remove(&team_name) {
            Some(row) => store.upsert_weekly_result(row)?,
            None => {
                store.delete_weekly_result(key, &team_name)?;
                update.removed.push(team_name);
            }
        }
    }

    store.recompute_current_positions(&key.league)?;
    Ok(update)
}

/// Returns `false` when the team is not on the roster.
fn apply_change<S: LadderStore + ?Sized>(
    store: &S,
    league: &str,
    team_name: &str,
    change: Contribution,
) -> Result<bool> {
    let Some(team) = store.find_team(league, team_name)? else {
        return Ok(false);
    };
    let mut row = store
        .standing(league, &team.id)?
        .unwrap_or_else(|| StandingsRow::new(league, &team));
    row.wins += change.wins;
    row.losses += change.losses;
    row.points += change.points;
    row.differential += change.differential;
    store.upsert_standing(row)?;
    Ok(true)
}

/// Add a manual adjustment to a team's standings.
pub fn adjust<S: LadderStore + ?Sized>(
    store: &S,
    league: &str,
    team_id: &str,
    adjustment: Adjustment,
) -> Result<StandingsRow> {
    let team = store
        .roster(league)?
        .into_iter()
        .find(|t| t.id == team_id)
        .ok_or_else(|| LadderError::UnknownTeam {
            league: league.to_string(),
            team: team_id.to_string(),
        })?;

    let mut row = store
        .standing(league, &team.id)?
        .unwrap_or_else(|| StandingsRow::new(league, &team));
    row.manual_wins_adj += adjustment.wins;
    row.manual_losses_adj += adjustment.losses;
    row.manual_points_adj += adjustment.points;
    row.manual_diff_adj += adjustment.differential;
    store.upsert_standing(row)?;
    store.recompute_current_positions(league)?;

    store
        .standing(league, &team.id)?
        .ok_or_else(|| LadderError::Persistence(format!("standings row for '{}' vanished", team.id)))
}
